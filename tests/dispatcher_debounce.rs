use std::collections::HashSet;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use siteforge::alert::Alert;
use siteforge::config::load_from_str;
use siteforge::errors::{PipelineError, Result as PipelineResult};
use siteforge::pipeline::{PipelineDriver, PipelineReport};
use siteforge::server::ReloadSink;
use siteforge::watch::{Dispatcher, WatchEvent, build_rule_profiles};

type TestResult = Result<(), Box<dyn Error>>;

const DEBOUNCE: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(300);

/// Driver that records dispatched task names instead of running steps.
#[derive(Debug, Clone, Default)]
struct FakeDriver {
    log: Arc<Mutex<Vec<String>>>,
    fail: HashSet<String>,
}

impl FakeDriver {
    fn dispatched(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl PipelineDriver for FakeDriver {
    fn run_task(
        &mut self,
        name: &str,
    ) -> impl Future<Output = PipelineResult<PipelineReport>> + Send {
        self.log.lock().unwrap().push(name.to_string());
        let result = if self.fail.contains(name) {
            Err(PipelineError::step_failure(name, "boom"))
        } else {
            Ok(PipelineReport {
                task: name.to_string(),
                steps_run: 1,
                steps_skipped: 0,
            })
        };
        std::future::ready(result)
    }
}

#[derive(Debug, Clone, Default)]
struct CountReload(Arc<AtomicUsize>);

impl CountReload {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ReloadSink for CountReload {
    fn notify_reload(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

const RULES: &str = r#"
    [step.compile-styles]
    kind = "command"
    cmd = "true"

    [step.bundle-scripts]
    kind = "command"
    cmd = "true"

    [step.copy-html]
    kind = "copy"

    [task.develop]
    steps = ["compile-styles", "bundle-scripts", "copy-html"]

    [[watch]]
    files = ["styles/**/*.less"]
    tasks = ["compile-styles"]
    live_reload = true

    [[watch]]
    files = ["scripts/**/*.js"]
    tasks = ["bundle-scripts", "copy-html"]
"#;

struct Harness {
    driver: FakeDriver,
    reload: CountReload,
    tx: mpsc::Sender<WatchEvent>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn start(driver: FakeDriver) -> Result<Harness, Box<dyn Error>> {
    let cfg = load_from_str(RULES)?;
    let profiles = build_rule_profiles(&cfg.watch)?;
    let reload = CountReload::default();
    let (tx, rx) = mpsc::channel(64);

    let dispatcher = Dispatcher::new(
        profiles,
        DEBOUNCE,
        driver.clone(),
        Alert::silent(),
        Box::new(reload.clone()),
        rx,
    );
    let handle = tokio::spawn(dispatcher.run());

    Ok(Harness {
        driver,
        reload,
        tx,
        handle,
    })
}

async fn changed(tx: &mpsc::Sender<WatchEvent>, path: &str) {
    tx.send(WatchEvent::PathChanged(path.to_string()))
        .await
        .expect("dispatcher is alive");
}

#[tokio::test]
async fn rapid_events_coalesce_into_one_dispatch() -> TestResult {
    let h = start(FakeDriver::default())?;

    for _ in 0..5 {
        changed(&h.tx, "styles/main.less").await;
    }
    sleep(SETTLE).await;

    assert_eq!(h.driver.dispatched(), vec!["compile-styles"]);
    assert_eq!(h.reload.count(), 1);

    h.tx.send(WatchEvent::Shutdown).await?;
    h.handle.await??;
    Ok(())
}

#[tokio::test]
async fn multiple_matched_rules_dispatch_in_registration_order() -> TestResult {
    let h = start(FakeDriver::default())?;

    // Second rule's path first; registration order must still win.
    changed(&h.tx, "scripts/app.js").await;
    changed(&h.tx, "styles/main.less").await;
    sleep(SETTLE).await;

    assert_eq!(
        h.driver.dispatched(),
        vec!["compile-styles", "bundle-scripts", "copy-html"]
    );
    // Only the first rule asked for a reload, and the run succeeded.
    assert_eq!(h.reload.count(), 1);

    h.tx.send(WatchEvent::Shutdown).await?;
    h.handle.await??;
    Ok(())
}

#[tokio::test]
async fn unwatched_churn_does_not_postpone_a_pending_dispatch() -> TestResult {
    let h = start(FakeDriver::default())?;

    // One matching change, then a steady stream of changes no rule watches,
    // each arriving faster than the debounce window. Only matching events
    // may push the deadline back, so the dispatch must still happen.
    changed(&h.tx, "styles/main.less").await;
    for _ in 0..12 {
        sleep(Duration::from_millis(25)).await;
        changed(&h.tx, "README.md").await;
    }
    sleep(SETTLE).await;

    assert_eq!(h.driver.dispatched(), vec!["compile-styles"]);
    assert_eq!(h.reload.count(), 1);

    h.tx.send(WatchEvent::Shutdown).await?;
    h.handle.await??;
    Ok(())
}

#[tokio::test]
async fn unmatched_paths_do_not_trigger_a_dispatch() -> TestResult {
    let h = start(FakeDriver::default())?;

    changed(&h.tx, "README.md").await;
    changed(&h.tx, "styles/main.css").await; // .css is not watched
    sleep(SETTLE).await;

    assert!(h.driver.dispatched().is_empty());
    assert_eq!(h.reload.count(), 0);

    h.tx.send(WatchEvent::Shutdown).await?;
    h.handle.await??;
    Ok(())
}

#[tokio::test]
async fn failed_run_skips_reload_and_keeps_watching() -> TestResult {
    let driver = FakeDriver {
        fail: HashSet::from(["compile-styles".to_string()]),
        ..FakeDriver::default()
    };
    let h = start(driver)?;

    // Both rules match, but the batch fails at its first task: later tasks
    // must not run and no reload is sent.
    changed(&h.tx, "styles/main.less").await;
    changed(&h.tx, "scripts/app.js").await;
    sleep(SETTLE).await;

    assert_eq!(h.driver.dispatched(), vec!["compile-styles"]);
    assert_eq!(h.reload.count(), 0);

    // The watch loop survives the failure and handles the next event.
    changed(&h.tx, "scripts/app.js").await;
    sleep(SETTLE).await;

    assert_eq!(
        h.driver.dispatched(),
        vec!["compile-styles", "bundle-scripts", "copy-html"]
    );

    h.tx.send(WatchEvent::Shutdown).await?;
    h.handle.await??;
    Ok(())
}

#[tokio::test]
async fn closing_the_event_channel_stops_the_dispatcher() -> TestResult {
    let h = start(FakeDriver::default())?;

    drop(h.tx);
    h.handle.await??;
    Ok(())
}
