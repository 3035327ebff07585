//! Check command implementation.
//!
//! Validates /proc accessibility, namespace readability and configuration.

use procinfo_exporter::process::memory::{parse_meminfo_content, PAGE_SIZE};
use procinfo_exporter::process::scanner::{collect_proc_entries, read_namespace_id};
use procinfo_exporter::source::testdata::load_test_data_from_file;
use std::fs;

use crate::config::{validate_effective_config, Config};

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 procinfo-exporter - System Check");
    println!("===================================");

    let mut all_ok = true;

    if let Some(path) = &config.test_data_file {
        println!("\n🧪 Checking test data file...");
        match load_test_data_from_file(path) {
            Ok(data) => println!(
                "   ✅ {} loaded: {} processes, page size {}",
                path.display(),
                data.processes.len(),
                data.page_size
            ),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    } else {
        let root = config.proc_root();

        println!("\n📁 Checking {} filesystem...", root.display());
        if root.exists() {
            let entries = collect_proc_entries(&root, Some(5));
            if entries.is_empty() {
                println!("   ❌ Cannot read any process entries from {}", root.display());
                all_ok = false;
            } else {
                println!("   ✅ Can read {} process entries", entries.len());
            }
        } else {
            println!("   ❌ {} not found", root.display());
            all_ok = false;
        }

        println!("\n💾 Checking host memory counters...");
        let meminfo = root.join("meminfo");
        match fs::read_to_string(&meminfo)
            .map_err(|e| e.to_string())
            .and_then(|c| parse_meminfo_content(&c, *PAGE_SIZE))
        {
            Ok(mem) => println!(
                "   ✅ {}: {} pages total, {} pages free",
                meminfo.display(),
                mem.total_pages,
                mem.free_pages
            ),
            Err(e) => {
                println!("   ❌ {}: {}", meminfo.display(), e);
                all_ok = false;
            }
        }

        println!("\n🧭 Checking namespace links of the root process...");
        let init = root.join("1");
        for kind in config.namespace_kinds() {
            match read_namespace_id(&init, kind) {
                Some(id) => println!("   ✅ {}/ns/{} = {}", init.display(), kind, id),
                None => {
                    println!(
                        "   ❌ Cannot read {}/ns/{} (container classification needs it)",
                        init.display(),
                        kind
                    );
                    all_ok = false;
                }
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
