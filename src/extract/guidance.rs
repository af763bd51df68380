//! Follow-up instructions printed after a successful extraction.

use std::fmt;

const RULE: &str = "=========================================";

/// What the operator still has to do on the standalone install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorGuidance {
    pub table_prefix: String,
    pub old_url: String,
    /// Install-relative uploads dir to flatten, absent for the primary site
    pub uploads_relocation: Option<String>,
}

impl fmt::Display for OperatorGuidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "In your new install in wp-config.php, set the $table_prefix to {}",
            self.table_prefix
        )?;
        writeln!(f, "You'll also need to do a search-replace for the url change")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "# update URLs")?;
        writeln!(f, "wp search-replace {} NEWURL", self.old_url)?;
        if let Some(uploads) = &self.uploads_relocation {
            writeln!(f, "# move the uploads to the typical directory")?;
            writeln!(f, "mv {}/* wp-content/uploads/", uploads)?;
            writeln!(f, "# remove the old directory")?;
            writeln!(f, "rm -rf wp-content/uploads/sites/")?;
            writeln!(f, "# update database")?;
            writeln!(f, "wp search-replace {}/ wp-content/uploads/", uploads)?;
        }
        write!(f, "{}", RULE)
    }
}

/// Human readable size with two decimals, e.g. `1.50 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(&str, u64)] = &[
        ("TB", 1 << 40),
        ("GB", 1 << 30),
        ("MB", 1 << 20),
        ("KB", 1 << 10),
    ];

    for (unit, magnitude) in UNITS {
        if bytes >= *magnitude {
            return format!("{:.2} {}", bytes as f64 / *magnitude as f64, unit);
        }
    }
    format!("{} B", bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_for_secondary_site() {
        let guidance = OperatorGuidance {
            table_prefix: "wp_5_".to_string(),
            old_url: "example.com/five".to_string(),
            uploads_relocation: Some("wp-content/uploads/sites/5".to_string()),
        };
        let text = guidance.to_string();

        assert!(text.starts_with(
            "In your new install in wp-config.php, set the $table_prefix to wp_5_\n"
        ));
        assert!(text.contains("wp search-replace example.com/five NEWURL\n"));
        assert!(text.contains("mv wp-content/uploads/sites/5/* wp-content/uploads/\n"));
        assert!(text.contains("wp search-replace wp-content/uploads/sites/5/ wp-content/uploads/\n"));
        assert!(text.ends_with(RULE));
    }

    #[test]
    fn test_guidance_for_primary_site_skips_uploads() {
        let guidance = OperatorGuidance {
            table_prefix: "wp_".to_string(),
            old_url: "example.com".to_string(),
            uploads_relocation: None,
        };
        let text = guidance.to_string();
        assert!(!text.contains("# move the uploads"));
        assert!(!text.contains("rm -rf"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
