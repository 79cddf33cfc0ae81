use colossus_core::model::roster::CreatureRoster;
use colossus_core::predict::{PredictorConfig, SplitPredictor};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
struct LevelCounter {
    errors: Arc<AtomicUsize>,
    warnings: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for LevelCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::ERROR => {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
            Level::WARN => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

fn observed(run: impl FnOnce()) -> (usize, usize) {
    let counter = LevelCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, run);
    (
        counter.errors.load(Ordering::SeqCst),
        counter.warnings.load(Ordering::SeqCst),
    )
}

fn split_red() -> SplitPredictor {
    let mut predictor = SplitPredictor::new(
        "Red",
        "Rd01",
        ["Titan", "Angel", "Centaur", "Centaur", "Gargoyle", "Gargoyle", "Ogre", "Ogre"],
        CreatureRoster::default_titan(),
        PredictorConfig::default(),
    );
    predictor
        .split("Rd01", 4, "Rd02", Some(false), &["Centaur", "Centaur"])
        .unwrap();
    predictor
}

#[test]
fn rejected_reveal_logs_an_error() {
    let mut predictor = split_red();
    let (errors, _) = observed(|| {
        assert!(
            predictor
                .reveal("Rd02", &["Ogre", "Ogre", "Gargoyle", "Gargoyle"], true)
                .is_err()
        );
    });
    assert_eq!(errors, 1);
}

#[test]
fn unsplittable_evidence_warns_instead_of_failing() {
    let mut predictor = split_red();
    let (errors, warnings) = observed(|| {
        predictor
            .reveal("Rd02", &["Centaur", "Centaur", "Gargoyle", "Ogre"], true)
            .unwrap();
    });
    assert_eq!(errors, 0);
    assert_eq!(warnings, 1);
}
