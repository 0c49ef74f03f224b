pub mod telemetry;

use chrono::prelude::*;

/// Returns the current local time formatted for use in a file name
///
/// Format: `YYYYmmdd-HHMMSS`
pub fn get_current_time() -> String {
    let curr = Local::now();
    curr.format("%Y%m%d-%H%M%S").to_string()
}

/// Default chart path for a run started now.
pub fn default_output() -> String {
    format!("capture-{}.svg", get_current_time())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_output() {
        let name = default_output();
        assert!(name.starts_with("capture-"));
        assert!(name.ends_with(".svg"));
        // capture- + YYYYmmdd-HHMMSS + .svg
        assert_eq!(name.len(), 8 + 15 + 4);
    }
}
