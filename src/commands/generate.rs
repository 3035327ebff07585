//! Generate testdata command implementation.
//!
//! Generates synthetic process tables loadable with `--test-data-file`.

use chrono::Utc;
use procinfo_exporter::process::state_code;
use procinfo_exporter::{HostMemory, NamespaceKind, NamespaceSet, ProcessRecord, TestData};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const PAGE_SIZE: u64 = 4096;
const NS_PER_SEC: u64 = 1_000_000_000;

/// Inode numbers the kernel gives the initial namespaces.
const HOST_UTS_NS: u64 = 4026531838;
const HOST_PID_NS: u64 = 4026531836;
const HOST_MNT_NS: u64 = 4026531841;
const HOST_NET_NS: u64 = 4026531840;

/// First inode handed out to namespaces created after boot.
const FIRST_CONTAINER_NS: u64 = 4026532200;

/// Containerized processes are grouped into containers of up to this many.
const PROCESSES_PER_CONTAINER: usize = 3;

const HOST_NAMES: &[&str] = &[
    "sshd",
    "cron",
    "rsyslogd",
    "dbus-daemon",
    "systemd-journal",
    "systemd-udevd",
    "containerd",
    "dockerd",
    "chronyd",
    "agetty",
    "bash",
    "postgres",
    "nginx",
];

const CONTAINER_NAMES: &[&str] = &["nginx", "node", "python3", "redis-server", "java", "sh"];

const STATES: &[char] = &['S', 'S', 'S', 'R', 'D', 'I'];

fn host_namespaces() -> NamespaceSet {
    NamespaceSet::default()
        .with(NamespaceKind::Uts, HOST_UTS_NS)
        .with(NamespaceKind::Pid, HOST_PID_NS)
        .with(NamespaceKind::Mnt, HOST_MNT_NS)
        .with(NamespaceKind::Net, HOST_NET_NS)
}

/// Namespaces of container `index`; every kind gets its own fresh inode.
fn container_namespaces(index: u64) -> NamespaceSet {
    let base = FIRST_CONTAINER_NS + index * 4;
    NamespaceSet::default()
        .with(NamespaceKind::Uts, base)
        .with(NamespaceKind::Pid, base + 1)
        .with(NamespaceKind::Mnt, base + 2)
        .with(NamespaceKind::Net, base + 3)
}

/// Builds a process table of init, kthreadd, `host` host processes and
/// `containerized` processes spread over containers.
pub fn generate_test_data(rng: &mut impl Rng, host: usize, containerized: usize) -> TestData {
    let total_pages: u64 = rng.gen_range(1_000_000..8_000_000);
    let free_pages = total_pages * rng.gen_range(10..70) / 100;
    // Between one hour and thirty days of uptime.
    let now_ns = rng.gen_range(3600..30 * 24 * 3600) * NS_PER_SEC;

    let mut processes = Vec::with_capacity(host + containerized + 2);

    processes.push(ProcessRecord {
        pid: 1,
        name: "systemd".to_string(),
        state: state_code('S'),
        start_time_ns: 100_000_000,
        cpu_time_ns: now_ns / 1000,
        resident_pages: Some(3_000),
        total_virtual_pages: Some(42_000),
        namespaces: host_namespaces(),
    });
    processes.push(ProcessRecord {
        pid: 2,
        name: "kthreadd".to_string(),
        state: state_code('S'),
        start_time_ns: 100_000_000,
        cpu_time_ns: 0,
        resident_pages: None,
        total_virtual_pages: None,
        namespaces: host_namespaces(),
    });

    let mut pid: u32 = 100;
    for _ in 0..host {
        let name = HOST_NAMES.choose(rng).copied().unwrap_or("process");
        processes.push(random_process(rng, pid, name, now_ns, host_namespaces()));
        pid += rng.gen_range(1..50);
    }

    for i in 0..containerized {
        let container = (i / PROCESSES_PER_CONTAINER) as u64;
        let name = CONTAINER_NAMES.choose(rng).copied().unwrap_or("process");
        processes.push(random_process(
            rng,
            pid,
            name,
            now_ns,
            container_namespaces(container),
        ));
        pid += rng.gen_range(1..50);
    }

    TestData {
        version: "1".to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        page_size: PAGE_SIZE,
        now_ns,
        host_memory: HostMemory {
            total_pages,
            free_pages,
        },
        processes,
    }
}

/// Generates a random process with a plausible memory footprint and CPU history.
fn random_process(
    rng: &mut impl Rng,
    pid: u32,
    name: &str,
    now_ns: u64,
    namespaces: NamespaceSet,
) -> ProcessRecord {
    let start_time_ns = rng.gen_range(NS_PER_SEC..now_ns);
    let lifetime = now_ns - start_time_ns;
    // 0-50% average CPU over the process lifetime
    let cpu_time_ns = lifetime / 100 * rng.gen_range(0..50);

    // RSS: 1 MB - 1 GB, VSZ: 2-8x RSS
    let resident_pages: u64 = rng.gen_range(256..262_144);
    let total_virtual_pages = resident_pages * rng.gen_range(2..8);

    let state = STATES.choose(rng).copied().unwrap_or('S');

    ProcessRecord {
        pid,
        name: name.to_string(),
        state: state_code(state),
        start_time_ns,
        cpu_time_ns,
        resident_pages: Some(resident_pages),
        total_virtual_pages: Some(total_virtual_pages),
        namespaces,
    }
}

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(
    output: PathBuf,
    processes: usize,
    containerized: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!(
        "Generating test data: processes={}, containerized={}, output={}",
        processes,
        containerized,
        output.display()
    );

    let mut rng = rand::thread_rng();
    let test_data = generate_test_data(&mut rng, processes, containerized);

    let json_content = serde_json::to_string_pretty(&test_data)?;
    fs::write(&output, &json_content)?;

    println!(
        "✅ Generated test data: {} processes ({} containerized) in {}",
        test_data.processes.len(),
        containerized,
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procinfo_exporter::{
        build_container_report, build_system_report, MemorySource, NamespaceClassifier,
        TestDataSource,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_generated_table_classifies_as_requested() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = generate_test_data(&mut rng, 10, 4);
        assert_eq!(data.processes.len(), 16);
        assert_eq!(data.processes[0].pid, 1);

        let source = MemorySource::new(data);
        let system = build_system_report(&source).unwrap();
        assert_eq!(system.processes.len(), 16);
        assert_eq!(system.processes[1].rss, 0);
        assert_eq!(system.processes[1].vsz, 0);

        for kinds in [vec![NamespaceKind::Uts], NamespaceKind::ALL.to_vec()] {
            let container =
                build_container_report(&source, &NamespaceClassifier::new(kinds)).unwrap();
            assert_eq!(container.processes.len(), 4);
        }
    }

    #[test]
    fn test_generated_cpu_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let source = MemorySource::new(generate_test_data(&mut rng, 30, 0));
        let system = build_system_report(&source).unwrap();
        assert!(system.processes.iter().all(|p| p.cpu <= 50));
    }

    #[test]
    fn test_command_writes_loadable_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("testdata.json");
        command_generate_testdata(path.clone(), 3, 2).unwrap();

        let source = TestDataSource::new(&path);
        let container =
            build_container_report(&source, &NamespaceClassifier::default()).unwrap();
        assert_eq!(container.processes.len(), 2);
    }
}
