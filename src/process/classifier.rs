//! Container classification for processes.
//!
//! A process is "containerized" when it lives in a namespace other than the
//! reference namespace (the one of the first/root process of the snapshot).
//! The policy sits behind [`ContainerClassifier`] so the container report
//! does not depend on which namespaces are compared.

use std::fmt;

use crate::process::{NamespaceKind, NamespaceSet, ProcessRecord};

/// Decides whether a process record belongs to a container.
pub trait ContainerClassifier: Send + Sync + fmt::Debug {
    /// `reference` is the namespace set of the root process of the snapshot.
    fn is_containerized(&self, record: &ProcessRecord, reference: &NamespaceSet) -> bool;
}

/// Compares namespace identifiers of one or more kinds against the reference.
///
/// With a single kind (the default, `uts`) this is a single-dimension
/// classifier: a process that shares every other namespace with init but has
/// its own UTS namespace is still containerized. With several kinds a process
/// is containerized as soon as any one of them differs. An identifier missing
/// on either side never counts as a difference.
#[derive(Debug, Clone)]
pub struct NamespaceClassifier {
    kinds: Vec<NamespaceKind>,
}

impl NamespaceClassifier {
    pub fn new(kinds: Vec<NamespaceKind>) -> Self {
        Self { kinds }
    }

    pub fn kinds(&self) -> &[NamespaceKind] {
        &self.kinds
    }
}

impl Default for NamespaceClassifier {
    fn default() -> Self {
        Self::new(vec![NamespaceKind::Uts])
    }
}

impl ContainerClassifier for NamespaceClassifier {
    fn is_containerized(&self, record: &ProcessRecord, reference: &NamespaceSet) -> bool {
        self.kinds.iter().any(|&kind| {
            match (record.namespace_id(kind), reference.get(kind)) {
                (Some(own), Some(root)) => own != root,
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, namespaces: NamespaceSet) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: format!("proc{}", pid),
            state: 1,
            start_time_ns: 0,
            cpu_time_ns: 0,
            resident_pages: None,
            total_virtual_pages: None,
            namespaces,
        }
    }

    // -------------------------------------------------------------------------
    // Tests for NamespaceClassifier (single kind)
    // -------------------------------------------------------------------------

    #[test]
    fn test_same_namespace_is_host() {
        let reference = NamespaceSet::default().with(NamespaceKind::Uts, 100);
        let rec = record(1, reference);
        assert!(!NamespaceClassifier::default().is_containerized(&rec, &reference));
    }

    #[test]
    fn test_different_namespace_is_container() {
        let reference = NamespaceSet::default().with(NamespaceKind::Uts, 100);
        let rec = record(42, NamespaceSet::default().with(NamespaceKind::Uts, 200));
        assert!(NamespaceClassifier::default().is_containerized(&rec, &reference));
    }

    #[test]
    fn test_only_configured_dimension_is_compared() {
        // Differs in net only: the default uts classifier ignores it
        let reference = NamespaceSet::default()
            .with(NamespaceKind::Uts, 100)
            .with(NamespaceKind::Net, 300);
        let rec = record(
            5,
            NamespaceSet::default()
                .with(NamespaceKind::Uts, 100)
                .with(NamespaceKind::Net, 301),
        );
        assert!(!NamespaceClassifier::default().is_containerized(&rec, &reference));
    }

    #[test]
    fn test_absent_namespace_is_host() {
        let reference = NamespaceSet::default().with(NamespaceKind::Uts, 100);
        let unreadable = record(9, NamespaceSet::default());
        assert!(!NamespaceClassifier::default().is_containerized(&unreadable, &reference));

        let rec = record(10, NamespaceSet::default().with(NamespaceKind::Uts, 200));
        assert!(!NamespaceClassifier::default().is_containerized(&rec, &NamespaceSet::default()));
    }

    // -------------------------------------------------------------------------
    // Tests for NamespaceClassifier (several kinds)
    // -------------------------------------------------------------------------

    #[test]
    fn test_any_configured_kind_differs() {
        let classifier = NamespaceClassifier::new(vec![NamespaceKind::Uts, NamespaceKind::Pid]);
        let reference = NamespaceSet::default()
            .with(NamespaceKind::Uts, 100)
            .with(NamespaceKind::Pid, 200);

        let pid_only = record(
            3,
            NamespaceSet::default()
                .with(NamespaceKind::Uts, 100)
                .with(NamespaceKind::Pid, 201),
        );
        assert!(classifier.is_containerized(&pid_only, &reference));

        let same = record(4, reference);
        assert!(!classifier.is_containerized(&same, &reference));
    }

    #[test]
    fn test_empty_kind_list_never_matches() {
        let classifier = NamespaceClassifier::new(Vec::new());
        let reference = NamespaceSet::default().with(NamespaceKind::Uts, 1);
        let rec = record(2, NamespaceSet::default().with(NamespaceKind::Uts, 2));
        assert!(!classifier.is_containerized(&rec, &reference));
    }
}
