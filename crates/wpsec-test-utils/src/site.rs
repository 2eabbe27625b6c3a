//! [`SiteFixture`]: a live WordPress tree and the baseline it came from.

use std::path::Path;

use crate::tree::TreeFixture;

/// Core files shared by the live tree and the baseline.
pub const CORE_FILES: &[(&str, &str)] = &[
    ("index.php", "<?php\ndefine('WP_USE_THEMES', true);\nrequire __DIR__ . '/wp-blog-header.php';\n"),
    ("wp-login.php", "<?php\n// login\n"),
    ("wp-admin/index.php", "<?php\n// dashboard\n"),
    ("wp-admin/includes/admin.php", "<?php\n// admin includes\n"),
    ("wp-includes/version.php", "<?php\n$wp_version = '6.4.2';\n$wp_db_version = 56657;\n"),
    ("wp-includes/functions.php", "<?php\n// functions\n"),
    ("wp-content/index.php", "<?php\n// Silence is golden.\n"),
    ("wp-content/plugins/x/core.php", "<?php\n// plugin x\n"),
];

/// Paired trees: `live` starts as an exact copy of `baseline`.
///
/// # Example
///
/// ```rust,no_run
/// use wpsec_test_utils::SiteFixture;
///
/// let site = SiteFixture::new();
/// site.live.write("wp-includes/functions.php", "<?php // hacked");
/// site.live.remove("wp-login.php");
/// ```
pub struct SiteFixture {
    pub live: TreeFixture,
    pub baseline: TreeFixture,
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteFixture {
    /// Both trees populated with [`CORE_FILES`], plus a live-only
    /// `wp-config.php`.
    pub fn new() -> Self {
        let live = TreeFixture::new();
        let baseline = TreeFixture::new();
        for (rel, content) in CORE_FILES {
            live.write(rel, content);
            baseline.write(rel, content);
        }
        live.write("wp-config.php", "<?php\ndefine('DB_NAME', 'site');\n");
        Self { live, baseline }
    }

    pub fn live_root(&self) -> &Path {
        self.live.path()
    }

    pub fn baseline_root(&self) -> &Path {
        self.baseline.path()
    }
}
