#![deny(warnings)]
pub mod game;
pub mod model;
pub mod predict;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "colossus"
    }

    pub const fn codename() -> &'static str {
        "Split Predictor"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "colossus");
        assert_eq!(AppInfo::codename(), "Split Predictor");
        assert!(!AppInfo::version().is_empty());
    }
}
