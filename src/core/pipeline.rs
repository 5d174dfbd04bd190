//! Clipboard pipeline: parse, format, vendor lookup, write-back and enrichment.
//!
//! One [`Pipeline`] consumes clipboard events serially. Each event either is
//! the echo of our own write (consumed by the [`LoopGuard`]) or starts a new
//! [`PipelineRun`]. The vendor-only run is published at once; enrichment runs
//! in a spawned task and is re-published only if no newer run started.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::clipboard::watcher::ClipboardEvent;
use crate::clipboard::ClipboardAccess;
use crate::config;
use crate::core::mac::{extract_mac_lines, MacAddress};
use crate::core::record::{MacAddressRecord, PipelineRun};
use crate::core::vendor::VendorTable;
use crate::display::DisplaySink;
use crate::enrichment::EnrichmentClient;
use crate::settings::ConfigContext;

pub const PROCESSED_TITLE: &str = "MAC Addresses Processed";
pub const ENRICHMENT_DISABLED_TITLE: &str = "Netdisco Lookup Disabled";

// ---- LoopGuard ----

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Listening,
    /// We wrote to the clipboard; the next notification is our own echo.
    SelfWritePending,
}

/// Suppresses the clipboard notification caused by our own write.
///
/// Any notification arriving while armed is taken to be the echo, including a
/// genuine external change that lands in that window.
#[derive(Debug, Default)]
pub struct LoopGuard {
    state: GuardState,
}

impl LoopGuard {
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Feed one notification. Returns true if it should be processed.
    pub fn on_notification(&mut self) -> bool {
        match self.state {
            GuardState::Listening => true,
            GuardState::SelfWritePending => {
                self.state = GuardState::Listening;
                false
            }
        }
    }

    /// Must be called before the clipboard write, not after.
    pub fn arm(&mut self) {
        self.state = GuardState::SelfWritePending;
    }

    /// The write failed, so no echo will come.
    pub fn disarm(&mut self) {
        self.state = GuardState::Listening;
    }
}

// ---- RunBoard ----

#[derive(Debug, Default)]
struct BoardState {
    current: u64,
    latest: Option<PipelineRun>,
}

/// Hands out run ids and holds the most recent published run.
///
/// Only the most recently started run may publish, so a slow enrichment of an
/// older run never overwrites a newer one.
#[derive(Debug, Default)]
pub struct RunBoard {
    state: Mutex<BoardState>,
    /// Serializes `populate` calls; never taken while `state` is held.
    display_order: Mutex<()>,
}

impl RunBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, superseding every earlier one.
    pub fn begin(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.current += 1;
        state.current
    }

    pub fn is_current(&self, run_id: u64) -> bool {
        self.state.lock().unwrap().current == run_id
    }

    /// Store `run` and hand its records to `display` if it is still current.
    ///
    /// `populate` runs after the state lock is released, so a sink may read
    /// the board (`latest`, `latest_records`) from inside it. Sinks must not
    /// call `publish` themselves.
    pub fn publish(&self, run: PipelineRun, display: &dyn DisplaySink) -> bool {
        let _order = self.display_order.lock().unwrap();
        let records = {
            let mut state = self.state.lock().unwrap();
            if run.id != state.current {
                return false;
            }
            let records = run.records.clone();
            state.latest = Some(run);
            records
        };
        display.populate(&records);
        true
    }

    pub fn latest(&self) -> Option<PipelineRun> {
        self.state.lock().unwrap().latest.clone()
    }

    /// Records of the latest run, empty before the first run.
    pub fn latest_records(&self) -> Vec<MacAddressRecord> {
        self.latest().map(|run| run.records).unwrap_or_default()
    }
}

// ---- Pipeline ----

/// What one clipboard notification led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Echo of our own write; nothing was read.
    EchoSuppressed,
    /// The clipboard was busy; retried on the next change.
    ClipboardUnavailable,
    /// No line of the clipboard text is an address.
    NoAddresses,
    Published { run_id: u64, rewritten: bool },
}

pub struct Pipeline {
    clipboard: Box<dyn ClipboardAccess>,
    vendors: Arc<VendorTable>,
    config: Arc<ConfigContext>,
    board: Arc<RunBoard>,
    display: Arc<dyn DisplaySink>,
    guard: LoopGuard,
    enrichment: Option<Arc<EnrichmentClient>>,
    /// Config generation the enrichment client was built from.
    enrichment_generation: Option<u64>,
    enrichment_timeout: Duration,
    in_flight: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(
        clipboard: Box<dyn ClipboardAccess>,
        vendors: Arc<VendorTable>,
        config: Arc<ConfigContext>,
        board: Arc<RunBoard>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            clipboard,
            vendors,
            config,
            board,
            display,
            guard: LoopGuard::default(),
            enrichment: None,
            enrichment_generation: None,
            enrichment_timeout: Duration::from_secs(config::ENRICHMENT_TIMEOUT_SECS),
            in_flight: Vec::new(),
        }
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    pub fn guard_state(&self) -> GuardState {
        self.guard.state()
    }

    /// Consume clipboard events until the sender side closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<ClipboardEvent>) {
        tracing::info!("Clipboard pipeline started");
        while let Some(event) = events.recv().await {
            let outcome = self.handle_notification();
            tracing::debug!(
                ?outcome,
                latency_ms = event.observed_at.elapsed().as_millis() as u64,
                "Clipboard event handled"
            );
        }
        self.settle().await;
        tracing::info!("Clipboard pipeline stopped");
    }

    /// Process one clipboard change notification.
    ///
    /// Must be called from within a tokio runtime: enrichment is spawned.
    pub fn handle_notification(&mut self) -> RunOutcome {
        if !self.guard.on_notification() {
            tracing::debug!("Ignoring clipboard echo of our own write");
            return RunOutcome::EchoSuppressed;
        }

        let text = match self.clipboard.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return RunOutcome::NoAddresses,
            Err(e) => {
                tracing::debug!("Skipping clipboard change: {e}");
                return RunOutcome::ClipboardUnavailable;
            }
        };

        let lines = extract_mac_lines(&text);
        if lines.is_empty() {
            return RunOutcome::NoAddresses;
        }

        self.refresh_enrichment();
        let notation = self.config.notation();
        let records: Vec<MacAddressRecord> = lines
            .iter()
            .filter_map(|line| {
                let address = MacAddress::parse(line).ok()?;
                Some(MacAddressRecord::new(
                    line,
                    address,
                    notation,
                    self.vendors.lookup(&address),
                ))
            })
            .collect();

        let run = PipelineRun::new(self.board.begin(), records);
        let run_id = run.id;
        tracing::info!(run_id, count = run.records.len(), "Recognized MAC addresses");

        let rewritten = run.needs_rewrite && self.write_back(&run);
        self.board.publish(run.clone(), self.display.as_ref());

        if let Some(client) = &self.enrichment {
            let handle = spawn_enrichment(
                Arc::clone(client),
                run,
                Arc::clone(&self.board),
                Arc::clone(&self.display),
            );
            self.in_flight.retain(|h| !h.is_finished());
            self.in_flight.push(handle);
        }

        RunOutcome::Published { run_id, rewritten }
    }

    /// Wait for every spawned enrichment task.
    pub async fn settle(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("Enrichment task failed: {e}");
            }
        }
    }

    fn write_back(&mut self, run: &PipelineRun) -> bool {
        self.guard.arm();
        match self.clipboard.write_text(&run.rewritten_text(config::LINE_ENDING)) {
            Ok(()) => {
                let changed = run.records.iter().filter(|r| r.is_reformatted()).count();
                self.display.notify(
                    PROCESSED_TITLE,
                    &format!(
                        "{changed} address(es) reformatted to {}",
                        self.config.notation().label()
                    ),
                );
                true
            }
            Err(e) => {
                self.guard.disarm();
                tracing::warn!("Could not write reformatted addresses: {e}");
                false
            }
        }
    }

    /// Rebuild the enrichment client if settings changed since it was built.
    fn refresh_enrichment(&mut self) {
        let generation = self.config.generation();
        if self.enrichment_generation == Some(generation) {
            return;
        }
        self.enrichment_generation = Some(generation);

        let settings = self.config.enrichment();
        if settings.base_url.is_empty() {
            if self.enrichment.take().is_some() {
                tracing::info!("Netdisco lookups disabled");
            }
            return;
        }

        match EnrichmentClient::from_settings(&settings, self.enrichment_timeout) {
            Ok(client) => {
                let client = client.with_token_store(Arc::clone(&self.config));
                tracing::info!("Netdisco lookups enabled for {}", client.base_url());
                self.enrichment = Some(Arc::new(client));
            }
            Err(e) => {
                self.enrichment = None;
                tracing::warn!("Netdisco lookups disabled: {e}");
                self.display.notify(ENRICHMENT_DISABLED_TITLE, &e.to_string());
            }
        }
    }
}

fn spawn_enrichment(
    client: Arc<EnrichmentClient>,
    mut run: PipelineRun,
    board: Arc<RunBoard>,
    display: Arc<dyn DisplaySink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !board.is_current(run.id) {
            tracing::debug!(run_id = run.id, "Skipping lookups for superseded run");
            return;
        }
        let mut lookups = JoinSet::new();
        for (index, record) in run.records.iter().enumerate() {
            let client = Arc::clone(&client);
            let address = record.address;
            lookups.spawn(async move { (index, client.lookup(&address).await) });
        }
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, location)) => run.records[index].location = location,
                Err(e) => tracing::warn!("Lookup task failed: {e}"),
            }
        }

        let run_id = run.id;
        if !board.publish(run, display.as_ref()) {
            tracing::debug!(run_id, "Discarding enrichment of superseded run");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::core::mac::MacNotation;
    use crate::core::record::LocationInfo;
    use crate::display::RecordingDisplay;
    use crate::enrichment::stub::{serve, serve_silent, Reply};
    use crate::settings::{AppSettings, EnrichmentSettings};
    use serde_json::json;

    const VENDORS: &str = "AA:BB:CC\tAcme\tAcme Corp\n00:1B:54\tCisco\tCisco Systems, Inc\n";

    struct Harness {
        clipboard: MemoryClipboard,
        display: Arc<RecordingDisplay>,
        board: Arc<RunBoard>,
        config: Arc<ConfigContext>,
        pipeline: Pipeline,
    }

    fn harness(settings: AppSettings) -> Harness {
        let clipboard = MemoryClipboard::default();
        let display = Arc::new(RecordingDisplay::default());
        let board = Arc::new(RunBoard::new());
        let config = Arc::new(ConfigContext::in_memory(settings));
        let pipeline = Pipeline::new(
            Box::new(clipboard.clone()),
            Arc::new(VendorTable::load(VENDORS)),
            Arc::clone(&config),
            Arc::clone(&board),
            display.clone(),
        )
        .with_enrichment_timeout(Duration::from_millis(300));
        Harness {
            clipboard,
            display,
            board,
            config,
            pipeline,
        }
    }

    fn colon() -> AppSettings {
        AppSettings {
            notation: MacNotation::Colon,
            ..AppSettings::default()
        }
    }

    fn with_netdisco(base_url: &str) -> AppSettings {
        AppSettings {
            notation: MacNotation::Colon,
            enrichment: EnrichmentSettings {
                base_url: base_url.to_string(),
                username: "ops".into(),
                password: "secret".into(),
                api_key: Some("token".into()),
            },
            vendor_dataset: None,
        }
    }

    #[test]
    fn test_guard_consumes_exactly_one_echo() {
        let mut guard = LoopGuard::default();
        assert!(guard.on_notification());
        guard.arm();
        assert_eq!(guard.state(), GuardState::SelfWritePending);
        assert!(!guard.on_notification());
        assert_eq!(guard.state(), GuardState::Listening);
        assert!(guard.on_notification());
    }

    #[test]
    fn test_guard_disarm_returns_to_listening() {
        let mut guard = LoopGuard::default();
        guard.arm();
        guard.disarm();
        assert!(guard.on_notification());
    }

    #[test]
    fn test_board_rejects_superseded_run() {
        let board = RunBoard::new();
        let display = RecordingDisplay::default();
        let old = board.begin();
        let new = board.begin();
        assert!(!board.publish(PipelineRun::new(old, Vec::new()), &display));
        assert!(board.publish(PipelineRun::new(new, Vec::new()), &display));
        assert_eq!(board.latest().unwrap().id, new);
        assert!(board.is_current(new));
        assert_eq!(display.populate_count(), 1);
    }

    /// Display that reads the board back while being populated.
    struct BoardReader {
        board: Arc<RunBoard>,
        seen: Mutex<Vec<u64>>,
    }

    impl DisplaySink for BoardReader {
        fn populate(&self, _records: &[MacAddressRecord]) {
            let latest = self.board.latest().map(|run| run.id).unwrap_or_default();
            self.seen.lock().unwrap().push(latest);
        }

        fn notify(&self, _title: &str, _message: &str) {}
    }

    #[test]
    fn test_display_may_read_board_during_populate() {
        let board = Arc::new(RunBoard::new());
        let display = BoardReader {
            board: Arc::clone(&board),
            seen: Mutex::new(Vec::new()),
        };
        let run = board.begin();
        assert!(board.publish(PipelineRun::new(run, Vec::new()), &display));
        assert!(board.is_current(run));
        assert_eq!(*display.seen.lock().unwrap(), vec![run]);
    }

    #[tokio::test]
    async fn test_superseded_run_sends_no_lookups() {
        let (base, mut requests) = serve(vec![Reply::json(200, json!({}))]).await;
        let client =
            EnrichmentClient::from_settings(&with_netdisco(&base).enrichment, Duration::from_secs(1))
                .unwrap();
        let board = Arc::new(RunBoard::new());
        let display = Arc::new(RecordingDisplay::default());
        let address = MacAddress::parse("AA:BB:CC:DD:EE:FF").unwrap();
        let record = MacAddressRecord::new("AA:BB:CC:DD:EE:FF", address, MacNotation::Colon, "Acme Corp");

        let old = board.begin();
        board.begin();
        spawn_enrichment(Arc::new(client), PipelineRun::new(old, vec![record]), Arc::clone(&board), display.clone())
            .await
            .unwrap();

        assert_eq!(display.populate_count(), 0);
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reformat_writes_once_and_echo_is_ignored() {
        let mut h = harness(colon());
        h.clipboard.set("aa-bb-cc-dd-ee-ff");

        let outcome = h.pipeline.handle_notification();
        assert!(matches!(outcome, RunOutcome::Published { rewritten: true, .. }));
        assert_eq!(h.clipboard.writes(), vec!["AA:BB:CC:DD:EE:FF".to_string()]);
        assert_eq!(h.pipeline.guard_state(), GuardState::SelfWritePending);
        assert_eq!(h.display.notice_titles(), vec![PROCESSED_TITLE.to_string()]);

        // The write triggers a notification of its own.
        assert_eq!(h.pipeline.handle_notification(), RunOutcome::EchoSuppressed);
        assert_eq!(h.clipboard.writes().len(), 1);
        assert_eq!(h.pipeline.guard_state(), GuardState::Listening);
        assert_eq!(h.display.populate_count(), 1);
    }

    #[tokio::test]
    async fn test_already_formatted_text_is_not_rewritten() {
        let mut h = harness(colon());
        h.clipboard.set("AA:BB:CC:DD:EE:FF");

        let outcome = h.pipeline.handle_notification();
        assert!(matches!(outcome, RunOutcome::Published { rewritten: false, .. }));
        assert!(h.clipboard.writes().is_empty());
        assert_eq!(h.pipeline.guard_state(), GuardState::Listening);

        let records = h.display.last().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vendor, "Acme Corp");
        assert!(h.display.notice_titles().is_empty());
    }

    #[tokio::test]
    async fn test_multiline_rewrite_keeps_only_addresses() {
        let mut h = harness(AppSettings::default());
        h.clipboard
            .set("aa:bb:cc:dd:ee:ff\r\nnot an address\n\n  00-1b-54-01-02-03  \n");

        h.pipeline.handle_notification();
        let expected = ["AABB.CCDD.EEFF", "001B.5401.0203"].join(config::LINE_ENDING);
        assert_eq!(h.clipboard.writes(), vec![expected]);

        let records = h.board.latest_records();
        assert_eq!(records[0].raw_text, "aa:bb:cc:dd:ee:ff");
        assert_eq!(records[1].raw_text, "00-1b-54-01-02-03");
        assert_eq!(records[1].vendor, "Cisco Systems, Inc");
    }

    #[tokio::test]
    async fn test_text_without_addresses_keeps_previous_run() {
        let mut h = harness(colon());
        h.clipboard.set("AA:BB:CC:DD:EE:FF");
        h.pipeline.handle_notification();

        h.clipboard.set("hello world");
        assert_eq!(h.pipeline.handle_notification(), RunOutcome::NoAddresses);
        assert_eq!(h.board.latest_records().len(), 1);
        assert_eq!(h.display.populate_count(), 1);
    }

    #[tokio::test]
    async fn test_busy_clipboard_is_skipped() {
        let mut h = harness(colon());
        h.clipboard.set("aa-bb-cc-dd-ee-ff");
        h.clipboard.set_busy(true);

        assert_eq!(h.pipeline.handle_notification(), RunOutcome::ClipboardUnavailable);
        assert_eq!(h.pipeline.guard_state(), GuardState::Listening);
        assert!(h.board.latest().is_none());

        h.clipboard.set_busy(false);
        assert!(matches!(
            h.pipeline.handle_notification(),
            RunOutcome::Published { rewritten: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_write_does_not_swallow_next_change() {
        let mut h = harness(colon());
        h.clipboard.set("aa-bb-cc-dd-ee-ff");

        // Clipboard grabbed by another process between our read and write.
        h.clipboard.set_busy(true);
        assert!(!h.pipeline.write_back(&PipelineRun::new(
            h.board.begin(),
            vec![MacAddressRecord::new(
                "aa-bb-cc-dd-ee-ff",
                MacAddress::parse("aa-bb-cc-dd-ee-ff").unwrap(),
                MacNotation::Colon,
                "Acme Corp",
            )],
        )));
        assert_eq!(h.pipeline.guard_state(), GuardState::Listening);
        assert!(h.display.notice_titles().is_empty());

        h.clipboard.set_busy(false);
        assert!(matches!(
            h.pipeline.handle_notification(),
            RunOutcome::Published { .. }
        ));
    }

    #[tokio::test]
    async fn test_enrichment_fills_location() {
        let (base, _requests) = serve(vec![Reply::json(
            200,
            json!({
                "ips": [{"ip": "10.0.0.15", "router_ip": "10.0.0.1"}],
                "sightings": [{"device": {"name": "access-sw-01"}, "switch": "10.0.255.10", "port": "Gi1/0/12"}]
            }),
        )])
        .await;
        let mut h = harness(with_netdisco(&base));
        h.clipboard.set("AA:BB:CC:DD:EE:FF");

        h.pipeline.handle_notification();
        h.pipeline.settle().await;

        let records = h.board.latest_records();
        assert_eq!(records[0].location.switch_port.as_deref(), Some("Gi1/0/12"));
        assert_eq!(records[0].vendor, "Acme Corp");
        // Vendor-only publish first, enriched publish second.
        assert_eq!(h.display.populate_count(), 2);
    }

    #[tokio::test]
    async fn test_enrichment_timeout_keeps_vendor() {
        let base = serve_silent().await;
        let mut h = harness(with_netdisco(&base));
        h.clipboard.set("aa-bb-cc-dd-ee-ff");

        h.pipeline.handle_notification();
        h.pipeline.settle().await;

        let records = h.board.latest_records();
        assert_eq!(records[0].vendor, "Acme Corp");
        assert_eq!(records[0].location, LocationInfo::unresolved());
    }

    #[tokio::test]
    async fn test_superseded_enrichment_is_discarded() {
        let base = serve_silent().await;
        let mut h = harness(with_netdisco(&base));

        h.clipboard.set("AA:BB:CC:DD:EE:FF");
        let first = h.pipeline.handle_notification();

        // A second copy arrives while the first lookup hangs; enrichment is
        // turned off so the second run stays vendor-only.
        h.config
            .update(|s| s.enrichment = EnrichmentSettings::default())
            .unwrap();
        h.clipboard.set("00:1B:54:01:02:03");
        let second = h.pipeline.handle_notification();
        h.pipeline.settle().await;

        let (RunOutcome::Published { run_id: first, .. }, RunOutcome::Published { run_id: second, .. }) =
            (first, second)
        else {
            panic!("both runs should publish");
        };
        assert!(second > first);
        let latest = h.board.latest().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.records[0].rendered_text, "00:1B:54:01:02:03");
        assert_eq!(h.display.populate_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_token_disables_enrichment_with_notice() {
        let mut settings = with_netdisco("https://netdisco.example.net");
        settings.enrichment.api_key = None;
        let mut h = harness(settings);
        h.clipboard.set("AA:BB:CC:DD:EE:FF");

        h.pipeline.handle_notification();
        h.pipeline.settle().await;
        assert_eq!(
            h.display.notice_titles(),
            vec![ENRICHMENT_DISABLED_TITLE.to_string()]
        );
        assert_eq!(h.display.populate_count(), 1);

        // Same generation: no repeated notice.
        h.clipboard.set("00:1B:54:01:02:03");
        h.pipeline.handle_notification();
        assert_eq!(h.display.notice_titles().len(), 1);
    }

    #[tokio::test]
    async fn test_run_loop_processes_events_until_closed() {
        let h = harness(colon());
        h.clipboard.set("aa-bb-cc-dd-ee-ff");
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(h.pipeline.run(rx));

        let event = ClipboardEvent {
            observed_at: std::time::Instant::now(),
        };
        tx.send(event).await.unwrap();
        tx.send(event).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(h.clipboard.writes().len(), 1);
        assert_eq!(h.board.latest_records()[0].rendered_text, "AA:BB:CC:DD:EE:FF");
    }
}
