//! Run orchestration: candidate resolution, classification, and the fixed
//! dispatch passes.
//!
//! Pass order is fixed: native targets, then JVM targets, then
//! terminating signal-cooperative targets, then surviving
//! signal-cooperative targets. Grouping by mechanism keeps log output
//! readable and never signals a process an earlier pass is about to
//! core-dump under another classification.

use crate::config::AnalyzerConfig;
use crate::platform::PlatformStrategies;
use crate::quota;
use crate::signal::{DiagnosticSignal, SignalDispatcher, Signaler};
use crate::sink::ProcessSink;
use ha_common::{Error, ProcessRecord, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Runtime class of a candidate process.
///
/// Classification is total: every candidate gets exactly one class before
/// dispatch begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Debugger-attachable native binary (or unrecognized runtime).
    Native,
    /// JVM process, introspected with jstack.
    Jvm,
    /// Emits diagnostics on signal and terminates; no native dump follows.
    SignalThenExit,
    /// Emits diagnostics on signal and keeps running; still backtraced,
    /// never core-dumped.
    SignalThenDump,
}

/// Classify one executable name.
pub fn classify(name: &str, go_names: &[String]) -> Classification {
    if name.starts_with("java") {
        Classification::Jvm
    } else if go_names.iter().any(|go| name.contains(go.as_str())) {
        Classification::SignalThenExit
    } else if name.starts_with("python") {
        Classification::SignalThenDump
    } else {
        Classification::Native
    }
}

/// Resolved candidate set for one run.
#[derive(Debug, Default)]
pub struct CandidateSet {
    pub candidates: Vec<(ProcessRecord, Classification)>,
    /// Requested pids absent from the snapshot; reported, never fatal.
    pub missing_pids: Vec<u32>,
}

/// Resolve the candidate set from a snapshot.
///
/// An explicit pid list overrides name matching entirely. The invoking
/// process's own pid is never a candidate, in either mode.
pub fn resolve_candidates(
    snapshot: &[ProcessRecord],
    config: &AnalyzerConfig,
    self_pid: u32,
) -> CandidateSet {
    let (matched, missing_pids) = if !config.target_pids.is_empty() {
        let requested: BTreeSet<u32> = config.target_pids.iter().copied().collect();
        let running: BTreeSet<u32> = snapshot.iter().map(|r| r.pid.0).collect();
        let matched: Vec<&ProcessRecord> = snapshot
            .iter()
            .filter(|r| requested.contains(&r.pid.0) && r.pid.0 != self_pid)
            .collect();
        let missing = requested.difference(&running).copied().collect();
        (matched, missing)
    } else {
        let matched = snapshot
            .iter()
            .filter(|r| {
                r.pid.0 != self_pid && config.all_interest_names().any(|ip| r.name.contains(ip))
            })
            .collect();
        (matched, Vec::new())
    };

    let candidates = matched
        .into_iter()
        .map(|r| (r.clone(), classify(&r.name, &config.go_names)))
        .collect();

    CandidateSet {
        candidates,
        missing_pids,
    }
}

/// Outcome of one per-process diagnostic attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum OutcomeStatus {
    /// Diagnostics completed; tool-missing skips land here too, they only
    /// warn.
    Completed,
    /// The diagnostic attempt failed; the sweep continued regardless.
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub pid: u32,
    pub name: String,
    pub classification: Classification,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Aggregate report for one analyzer run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub platform: &'static str,
    pub candidates: usize,
    pub missing_pids: Vec<u32>,
    pub outcomes: Vec<ProcessOutcome>,
}

impl RunReport {
    /// Whether any per-process diagnostic failed.
    pub fn any_failed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, OutcomeStatus::Failed(_)))
    }
}

/// Drives a full diagnostic sweep over the candidate set.
pub struct Orchestrator {
    config: AnalyzerConfig,
    strategies: PlatformStrategies,
    signaler: Box<dyn Signaler>,
    self_pid: u32,
    work_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(config: AnalyzerConfig, strategies: PlatformStrategies) -> Self {
        let signaler = Box::new(SignalDispatcher::new(config.grace));
        Self {
            config,
            strategies,
            signaler,
            self_pid: std::process::id(),
            work_dir: PathBuf::from("."),
        }
    }

    /// Override the working directory holding dump artifacts and log files.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Replace the signal delivery backend.
    pub fn with_signaler(mut self, signaler: Box<dyn Signaler>) -> Self {
        self.signaler = signaler;
        self
    }

    /// Run the sweep: snapshot once, classify, dispatch the fixed passes.
    pub fn run(&self) -> Result<RunReport> {
        let snapshot = self.strategies.enumerator.snapshot()?;
        let resolved = resolve_candidates(&snapshot, &self.config, self.self_pid);

        if !resolved.missing_pids.is_empty() {
            warn!(
                missing = ?resolved.missing_pids,
                "the following requested process ids are not running"
            );
        }
        let described: Vec<String> = resolved
            .candidates
            .iter()
            .map(|(r, c)| format!("{} {} ({c:?})", r.pid, r.name))
            .collect();
        info!(
            count = described.len(),
            processes = ?described,
            "found interesting processes"
        );

        let mut report = RunReport {
            started_at: chrono::Utc::now().to_rfc3339(),
            platform: self.strategies.label,
            candidates: resolved.candidates.len(),
            missing_pids: resolved.missing_pids.clone(),
            outcomes: Vec::new(),
        };

        self.native_pass(&resolved, &mut report);
        self.jvm_pass(&resolved, &mut report);
        self.terminating_signal_pass(&resolved, &mut report);
        self.surviving_signal_pass(&resolved, &mut report);

        info!("done analyzing all processes for hangs");
        Ok(report)
    }

    fn candidates_of<'a>(
        resolved: &'a CandidateSet,
        class: Classification,
    ) -> impl Iterator<Item = &'a ProcessRecord> {
        resolved
            .candidates
            .iter()
            .filter(move |(_, c)| *c == class)
            .map(|(r, _)| r)
    }

    fn native_pass(&self, resolved: &CandidateSet, report: &mut RunReport) {
        for record in Self::candidates_of(resolved, Classification::Native) {
            let status = self.dump_native(record, self.config.dump_core);
            report
                .outcomes
                .push(outcome(record, Classification::Native, status));
        }
    }

    fn jvm_pass(&self, resolved: &CandidateSet, report: &mut RunReport) {
        for record in Self::candidates_of(resolved, Classification::Jvm) {
            let status = self.open_sink(record).and_then(|mut sink| {
                self.strategies
                    .jvm
                    .dump_info(&mut sink, record.pid, &record.name)
            });
            report
                .outcomes
                .push(outcome(record, Classification::Jvm, status));
        }
    }

    fn terminating_signal_pass(&self, resolved: &CandidateSet, report: &mut RunReport) {
        for record in Self::candidates_of(resolved, Classification::SignalThenExit) {
            info!(
                pid = %record.pid,
                name = %record.name,
                signal = %DiagnosticSignal::Abort,
                "sending signal to go process"
            );
            // The signal itself produces the diagnostics; delivery failure
            // is a warning, not a run failure.
            if let Err(e) = self.signaler.signal(record.pid, DiagnosticSignal::Abort) {
                warn!(pid = %record.pid, error = %e, "diagnostic signal not delivered");
            }
            report
                .outcomes
                .push(outcome(record, Classification::SignalThenExit, Ok(())));
        }
    }

    fn surviving_signal_pass(&self, resolved: &CandidateSet, report: &mut RunReport) {
        for record in Self::candidates_of(resolved, Classification::SignalThenDump) {
            info!(
                pid = %record.pid,
                name = %record.name,
                signal = %DiagnosticSignal::UserReport,
                "sending signal to python process"
            );
            if let Err(e) = self
                .signaler
                .signal(record.pid, DiagnosticSignal::UserReport)
            {
                warn!(pid = %record.pid, error = %e, "diagnostic signal not delivered");
            }
            // Signal output is the primary diagnostic here; the backtrace
            // is still taken, with dumping forced off.
            let status = self.dump_native(record, false);
            report
                .outcomes
                .push(outcome(record, Classification::SignalThenDump, status));
        }
    }

    /// Attach the native debugger to one target. A dump request is still
    /// gated by the quota, recomputed here for every single target.
    fn dump_native(&self, record: &ProcessRecord, request_dump: bool) -> Result<()> {
        let want_dump = request_dump && self.dump_allowed();
        let mut sink = self.open_sink(record)?;
        self.strategies
            .debugger
            .dump_info(&mut sink, record.pid, &record.name, want_dump)
    }

    fn dump_allowed(&self) -> bool {
        match quota::within_quota(
            &self.work_dir,
            self.config.max_dump_bytes,
            self.strategies.debugger.dump_ext(),
        ) {
            Ok(within) => {
                if !within {
                    warn!(
                        ceiling_bytes = self.config.max_dump_bytes,
                        "dump quota exceeded, skipping core dump"
                    );
                }
                within
            }
            Err(e) => {
                warn!(error = %e, "dump quota check failed, skipping core dump");
                false
            }
        }
    }

    fn open_sink(&self, record: &ProcessRecord) -> Result<ProcessSink> {
        ProcessSink::open(&self.config.sinks, &self.work_dir, &record.name, record.pid)
            .map_err(Error::Io)
    }
}

fn outcome(
    record: &ProcessRecord,
    classification: Classification,
    status: Result<()>,
) -> ProcessOutcome {
    let status = match status {
        Ok(()) => OutcomeStatus::Completed,
        Err(e) => {
            error!(
                pid = %record.pid,
                name = %record.name,
                error = %e,
                "diagnostics failed for process"
            );
            OutcomeStatus::Failed(e.to_string())
        }
    };
    ProcessOutcome {
        pid: record.pid.0,
        name: record.name.clone(),
        classification,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::{JvmDumper, NativeDebugger};
    use crate::enumerate::ProcessEnumerator;
    use ha_common::ProcessId;
    use std::sync::{Arc, Mutex};

    fn config_with(interest: &[&str], go: &[&str]) -> AnalyzerConfig {
        AnalyzerConfig {
            interest_names: interest.iter().map(|s| s.to_string()).collect(),
            go_names: go.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    // =====================================================
    // Classification
    // =====================================================

    #[test]
    fn java_prefix_classifies_as_jvm() {
        assert_eq!(classify("javaservice", &[]), Classification::Jvm);
        assert_eq!(classify("java", &[]), Classification::Jvm);
    }

    #[test]
    fn python_prefix_survives_its_signal() {
        assert_eq!(classify("python", &[]), Classification::SignalThenDump);
        assert_eq!(classify("python2.7", &[]), Classification::SignalThenDump);
    }

    #[test]
    fn go_names_terminate_after_signal() {
        let go = vec!["myapp-go".to_string()];
        assert_eq!(classify("myapp-go", &go), Classification::SignalThenExit);
        // Substring semantics, like interest matching.
        assert_eq!(
            classify("run-myapp-go-2", &go),
            Classification::SignalThenExit
        );
    }

    #[test]
    fn jvm_prefix_wins_over_go_membership() {
        let go = vec!["java-worker".to_string()];
        assert_eq!(classify("java-worker", &go), Classification::Jvm);
    }

    #[test]
    fn everything_else_is_native() {
        assert_eq!(classify("mongod", &[]), Classification::Native);
        assert_eq!(classify("dbtest", &[]), Classification::Native);
        // Unrecognized runtimes fall through to the debugger.
        assert_eq!(classify("node", &[]), Classification::Native);
    }

    // =====================================================
    // Candidate resolution
    // =====================================================

    #[test]
    fn own_pid_is_never_a_candidate() {
        let snapshot = vec![
            ProcessRecord::new(10, "mongod"),
            ProcessRecord::new(40, "mongod"),
        ];
        let config = config_with(&["mongod"], &[]);

        let resolved = resolve_candidates(&snapshot, &config, 40);
        assert_eq!(resolved.candidates.len(), 1);
        assert_eq!(resolved.candidates[0].0.pid, ProcessId(10));

        // Same exclusion under an explicit pid list.
        let config = AnalyzerConfig {
            target_pids: vec![10, 40],
            ..config
        };
        let resolved = resolve_candidates(&snapshot, &config, 40);
        assert_eq!(resolved.candidates.len(), 1);
        assert_eq!(resolved.candidates[0].0.pid, ProcessId(10));
    }

    #[test]
    fn matching_is_substring_and_case_sensitive() {
        let snapshot = vec![
            ProcessRecord::new(1, "mongod"),
            ProcessRecord::new(2, "MONGOD"),
        ];
        let config = config_with(&["mongo"], &[]);

        let resolved = resolve_candidates(&snapshot, &config, 0);
        assert_eq!(resolved.candidates.len(), 1);
        assert_eq!(resolved.candidates[0].0.name, "mongod");
    }

    #[test]
    fn missing_pids_are_reported_not_fatal() {
        let snapshot = vec![
            ProcessRecord::new(10, "mongod"),
            ProcessRecord::new(20, "mongos"),
        ];
        let config = AnalyzerConfig {
            target_pids: vec![10, 20, 30, 31],
            ..AnalyzerConfig::default()
        };

        let resolved = resolve_candidates(&snapshot, &config, 0);
        assert_eq!(resolved.candidates.len(), 2);
        assert_eq!(resolved.missing_pids, vec![30, 31]);
    }

    #[test]
    fn pid_list_overrides_name_matching() {
        let snapshot = vec![
            ProcessRecord::new(10, "mongod"),
            ProcessRecord::new(20, "unrelated"),
        ];
        let config = AnalyzerConfig {
            target_pids: vec![20],
            ..config_with(&["mongod"], &[])
        };

        let resolved = resolve_candidates(&snapshot, &config, 0);
        assert_eq!(resolved.candidates.len(), 1);
        assert_eq!(resolved.candidates[0].0.name, "unrelated");
    }

    // =====================================================
    // Dispatch passes, driven through stub strategies
    // =====================================================

    #[derive(Clone, Default)]
    struct Recorder {
        native: Arc<Mutex<Vec<(u32, bool)>>>,
        jvm: Arc<Mutex<Vec<u32>>>,
        signals: Arc<Mutex<Vec<(u32, DiagnosticSignal)>>>,
    }

    struct StubEnumerator(Vec<ProcessRecord>);

    impl ProcessEnumerator for StubEnumerator {
        fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
            Ok(self.0.clone())
        }
    }

    struct StubDebugger(Recorder);

    impl NativeDebugger for StubDebugger {
        fn dump_info(
            &self,
            sink: &mut ProcessSink,
            pid: ProcessId,
            _name: &str,
            take_dump: bool,
        ) -> Result<()> {
            sink.log("thread backtrace output");
            self.0.native.lock().unwrap().push((pid.0, take_dump));
            Ok(())
        }

        fn dump_ext(&self) -> &'static str {
            "core"
        }
    }

    struct StubJvm(Recorder);

    impl JvmDumper for StubJvm {
        fn dump_info(&self, _sink: &mut ProcessSink, pid: ProcessId, _name: &str) -> Result<()> {
            self.0.jvm.lock().unwrap().push(pid.0);
            Ok(())
        }
    }

    struct StubSignaler(Recorder);

    impl Signaler for StubSignaler {
        fn signal(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()> {
            self.0.signals.lock().unwrap().push((pid.0, signal));
            Ok(())
        }
    }

    fn stub_orchestrator(
        snapshot: Vec<ProcessRecord>,
        config: AnalyzerConfig,
        recorder: &Recorder,
        work_dir: &std::path::Path,
    ) -> Orchestrator {
        let strategies = PlatformStrategies {
            label: "stub",
            enumerator: Box::new(StubEnumerator(snapshot)),
            debugger: Box::new(StubDebugger(recorder.clone())),
            jvm: Box::new(StubJvm(recorder.clone())),
        };
        Orchestrator::new(config, strategies)
            .with_work_dir(work_dir)
            .with_signaler(Box::new(StubSignaler(recorder.clone())))
    }

    #[test]
    fn dispatch_groups_by_classification() {
        let dir = tempfile::tempdir().expect("tempdir");
        // The invoking process matches the interest set by name; only the
        // self-pid exclusion keeps it out of the sweep.
        let own_pid = std::process::id();
        let snapshot = vec![
            ProcessRecord::new(10, "mongod"),
            ProcessRecord::new(20, "myapp-go"),
            ProcessRecord::new(30, "javaservice"),
            ProcessRecord::new(own_pid, "mongod"),
        ];
        let config = AnalyzerConfig {
            dump_core: true,
            ..config_with(&["mongod"], &["myapp-go"])
        };

        let recorder = Recorder::default();
        let orchestrator = stub_orchestrator(snapshot, config, &recorder, dir.path());
        let report = orchestrator.run().expect("run");

        // Native dump for pid 10 only, with the dump allowed by quota.
        assert_eq!(*recorder.native.lock().unwrap(), vec![(10, true)]);
        // javaservice is not in the interest set: the JVM pass is empty.
        assert!(recorder.jvm.lock().unwrap().is_empty());
        // The go process gets the terminating signal and nothing else.
        assert_eq!(
            *recorder.signals.lock().unwrap(),
            vec![(20, DiagnosticSignal::Abort)]
        );

        assert_eq!(report.candidates, 2);
        assert!(!report.any_failed());
        assert!(report.missing_pids.is_empty());
    }

    #[test]
    fn exhausted_quota_suppresses_dump_but_not_backtrace() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("dump_old_1.core"), b"x").expect("fixture");

        let snapshot = vec![ProcessRecord::new(10, "mongod")];
        let config = AnalyzerConfig {
            dump_core: true,
            max_dump_bytes: 0,
            ..config_with(&["mongod"], &[])
        };

        let recorder = Recorder::default();
        let orchestrator = stub_orchestrator(snapshot, config, &recorder, dir.path());
        let report = orchestrator.run().expect("run");

        // The backtrace still ran; only the dump flag was withdrawn.
        assert_eq!(*recorder.native.lock().unwrap(), vec![(10, false)]);
        assert!(!report.any_failed());

        let cores = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "core"))
            .count();
        assert_eq!(cores, 1, "no new core file may appear");
    }

    #[test]
    fn surviving_flavor_signals_then_backtraces_without_dump() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = vec![ProcessRecord::new(50, "python")];
        let config = AnalyzerConfig {
            dump_core: true, // must still be forced off for this flavor
            ..config_with(&["python"], &[])
        };

        let recorder = Recorder::default();
        let orchestrator = stub_orchestrator(snapshot, config, &recorder, dir.path());
        let report = orchestrator.run().expect("run");

        assert_eq!(
            *recorder.signals.lock().unwrap(),
            vec![(50, DiagnosticSignal::UserReport)]
        );
        assert_eq!(*recorder.native.lock().unwrap(), vec![(50, false)]);
        assert!(!report.any_failed());
    }

    #[test]
    fn jvm_candidates_go_through_jstack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = vec![ProcessRecord::new(30, "javaservice")];
        let config = config_with(&["java"], &[]);

        let recorder = Recorder::default();
        let orchestrator = stub_orchestrator(snapshot, config, &recorder, dir.path());
        orchestrator.run().expect("run");

        assert_eq!(*recorder.jvm.lock().unwrap(), vec![30]);
        assert!(recorder.native.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_diagnostics_are_contained_and_aggregated() {
        struct FailingDebugger;

        impl NativeDebugger for FailingDebugger {
            fn dump_info(
                &self,
                _sink: &mut ProcessSink,
                _pid: ProcessId,
                _name: &str,
                _take_dump: bool,
            ) -> Result<()> {
                Err(Error::ToolFailed {
                    tool: "gdb".to_string(),
                    code: 1,
                })
            }

            fn dump_ext(&self) -> &'static str {
                "core"
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let recorder = Recorder::default();
        let strategies = PlatformStrategies {
            label: "stub",
            enumerator: Box::new(StubEnumerator(vec![
                ProcessRecord::new(10, "mongod"),
                ProcessRecord::new(11, "mongos"),
            ])),
            debugger: Box::new(FailingDebugger),
            jvm: Box::new(StubJvm(recorder.clone())),
        };
        let orchestrator = Orchestrator::new(config_with(&["mongo"], &[]), strategies)
            .with_work_dir(dir.path())
            .with_signaler(Box::new(StubSignaler(recorder)));

        let report = orchestrator.run().expect("run survives per-process failure");
        assert_eq!(report.outcomes.len(), 2, "both targets were attempted");
        assert!(report.any_failed());
    }
}
