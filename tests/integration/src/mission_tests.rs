//! Mission tests: whole-site scenarios across wpsec-fs and wpsec-core
//!
//! Each module walks one operator workflow end to end against fixture trees:
//! audit, repair, permission reset, and baseline lookup.

use std::collections::BTreeSet;
use std::fs;

use wpsec_core::{
    BaselineProvider, DriftStatus, IntegrityEngine, PermissionEngine, PolicyDocument, Release,
    ReleaseCache, Report, ScanConfig, SkipList, check,
};
use wpsec_fs::{checksum, walk};
use wpsec_test_utils::{SiteFixture, TreeFixture, site::CORE_FILES};

/// A compromised site: one edited core file, one deleted, a dropped
/// webshell, user uploads, and a tampered plugin.
fn compromised_site() -> SiteFixture {
    let site = SiteFixture::new();
    site.live.write("wp-includes/functions.php", "<?php eval(base64_decode($_POST['c']));");
    site.live.remove("wp-admin/includes/admin.php");
    site.live.write("wp-includes/css/.cache.php", "<?php system($_GET['x']);");
    site.live.write("wp-content/uploads/2024/05/cat.jpg", [0xffu8, 0xd8, 0xff, 0xe0]);
    site.live.write("wp-content/plugins/x/core.php", "<?php // injected");
    site
}

fn paths(report: &Report) -> BTreeSet<String> {
    report.drifted().map(|p| p.to_string()).collect()
}

mod m1_audit {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn audit_finds_every_kind_of_drift() {
        let site = compromised_site();

        let report = check(
            site.live_root(),
            site.baseline_root(),
            &SkipList::new(["wp-config.php"]),
            false,
        )
        .unwrap();

        assert_eq!(
            paths(&report),
            BTreeSet::from([
                "wp-admin/includes/admin.php".to_string(),
                "wp-content/plugins/x/core.php".to_string(),
                "wp-includes/functions.php".to_string(),
            ])
        );
        let extras: Vec<String> = report.non_core().iter().map(|p| p.to_string()).collect();
        assert_eq!(extras, vec!["wp-includes/css".to_string()]);
    }

    #[test]
    fn audit_never_reads_skipped_config() {
        let site = SiteFixture::new();
        site.baseline.write("wp-config.php", "<?php // sample");
        #[cfg(unix)]
        site.live.set_mode("wp-config.php", 0o000);

        let config = ScanConfig::new(site.live_root()).unwrap().with_verbose(true);
        let report = IntegrityEngine::new(&config)
            .run(site.baseline_root(), false)
            .unwrap();

        #[cfg(unix)]
        site.live.set_mode("wp-config.php", 0o600);
        assert!(report.issues().is_empty());
        assert!(report.export().iter().all(|row| row.path != "wp-config.php"));
    }

    #[test]
    fn audit_is_read_only() {
        let site = compromised_site();
        let before: Vec<(String, String)> = snapshot(site.live_root());

        check(site.live_root(), site.baseline_root(), &SkipList::default(), true).unwrap();

        assert_eq!(snapshot(site.live_root()), before);
    }

    fn snapshot(root: &std::path::Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = walk(root, &SkipList::default())
            .map(Result::unwrap)
            .filter(|entry| !entry.is_dir)
            .map(|entry| {
                let sum = checksum::compute_file_checksum(&entry.path).unwrap();
                (entry.relative.to_string(), sum)
            })
            .collect();
        files.sort();
        files
    }
}

mod m2_repair {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repair_restores_core_and_leaves_the_rest() {
        let site = compromised_site();
        let config = ScanConfig::new(site.live_root()).unwrap().with_workers(4);

        let report = IntegrityEngine::new(&config)
            .run(site.baseline_root(), true)
            .unwrap();

        for (rel, _) in CORE_FILES {
            assert_eq!(site.live.read(rel), site.baseline.read(rel), "{rel} differs after repair");
        }
        for rel in paths(&report) {
            assert!(report.flags(&rel).unwrap().updated, "{rel} not marked updated");
        }
        // Non-core and user content are reported or ignored, never deleted.
        site.live.assert_file_exists("wp-includes/css/.cache.php");
        site.live.assert_file_exists("wp-content/uploads/2024/05/cat.jpg");
        site.live.assert_file_contains("wp-config.php", "DB_NAME");
    }

    #[test]
    fn repair_leaves_no_temp_files() {
        let site = compromised_site();
        let config = ScanConfig::new(site.live_root()).unwrap();

        IntegrityEngine::new(&config)
            .run(site.baseline_root(), true)
            .unwrap();

        let leftovers: Vec<String> = walk(site.live_root(), &SkipList::default())
            .map(Result::unwrap)
            .map(|entry| entry.relative.to_string())
            .filter(|rel| rel.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn repaired_site_audits_clean() {
        let site = compromised_site();
        let config = ScanConfig::new(site.live_root()).unwrap();
        let engine = IntegrityEngine::new(&config);

        engine.run(site.baseline_root(), true).unwrap();
        let report = engine.compare(site.baseline_root()).unwrap();

        assert_eq!(report.len(), 0);
    }

    #[test]
    fn flags_accumulate_in_any_order() {
        let mut forward = Report::new();
        let mut backward = Report::new();
        let events = [
            ("a.php", DriftStatus::Changed),
            ("b.php", DriftStatus::Missing),
            ("c.php", DriftStatus::Matched),
        ];
        for (path, status) in events {
            forward.record(path, status).unwrap();
        }
        for (path, status) in events.iter().rev() {
            backward.record(*path, *status).unwrap();
        }

        for (path, _) in events {
            assert_eq!(forward.flags(path), backward.flags(path));
        }
    }
}

#[cfg(unix)]
mod m3_permissions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hardened_sweep_after_repair() {
        let site = compromised_site();
        site.live.write("wp-content/.htaccess", "Options -Indexes");
        let config = ScanConfig::new(site.live_root()).unwrap();

        IntegrityEngine::new(&config)
            .run(site.baseline_root(), true)
            .unwrap();
        let profile = PolicyDocument::builtin().profile("hardened").unwrap();
        let report = PermissionEngine::new(&config).apply(&profile).unwrap();

        assert!(report.issues().is_empty());
        assert_eq!(site.live.mode("wp-admin/includes/admin.php"), 0o640);
        assert_eq!(site.live.mode("wp-includes/functions.php"), 0o640);
        assert_eq!(site.live.mode("wp-content/.htaccess"), 0o444);
        assert_eq!(site.live.mode("index.php"), 0o644);
        assert_eq!(site.live.mode("wp-content/uploads"), 0o755);
    }

    #[test]
    fn every_entry_gets_its_resolved_mode() {
        let tree = TreeFixture::new()
            .file("a/one.php", "1")
            .file("a/b/two.txt", "2")
            .file("three.php", "3");
        let doc = PolicyDocument::from_yaml_str(
            "default:\n  file: '0600'\n  directory: '0700'\nstrict:\n  '\\.php$': '0400'\n",
        )
        .unwrap();
        let profile = doc.profile("strict").unwrap();
        let config = ScanConfig::new(tree.path()).unwrap();

        PermissionEngine::new(&config).apply(&profile).unwrap();

        assert_eq!(tree.mode("a/one.php"), 0o400);
        assert_eq!(tree.mode("three.php"), 0o400);
        assert_eq!(tree.mode("a/b/two.txt"), 0o600);
        assert_eq!(tree.mode("a"), 0o700);
        assert_eq!(tree.mode("a/b"), 0o700);
    }
}

mod m4_baselines {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detected_release_resolves_in_cache() {
        let site = SiteFixture::new();
        let cache = tempfile::tempdir().unwrap();
        let release_root = cache.path().join("6.4.2").join("en_US").join("wordpress");
        for (rel, content) in CORE_FILES {
            let path = release_root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        let release = Release::new(wpsec_core::detect_version(site.live_root()).unwrap(), "en_US");
        let baseline = ReleaseCache::new(cache.path()).provide(&release).unwrap();
        let config = ScanConfig::new(site.live_root()).unwrap();
        let report = IntegrityEngine::new(&config).run(&baseline, false).unwrap();

        assert!(report.is_empty());
    }

    #[test]
    fn report_serializes_for_scripting() {
        let site = compromised_site();
        let report = check(site.live_root(), site.baseline_root(), &SkipList::new(["wp-config.php"]), false)
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"].as_array().unwrap().len(), 3);
        assert_eq!(json["non_core"][0], "wp-includes/css");
    }
}
