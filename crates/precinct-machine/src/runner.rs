//! The controller event loop.
//!
//! One task owns the state and context and applies events strictly one at a
//! time:
//!
//! ```text
//!  status watcher ─┐
//!  action executor ┼──► events ──► step() ──► store writes ──► enter state
//!  timers ─────────┤                                              │
//!  commands ───────┘     ◄── cancel old activities, start new ────┘
//! ```
//!
//! Every state entry bumps an epoch. Watchers, executors and timers tag their
//! events with the epoch they were started under; anything from an older
//! epoch is discarded. A scan runs in its own detached task so an abandoned
//! scan still finishes archiving its images.

use crate::action::{Action, PollRate};
use crate::config::MachineConfig;
use crate::context::Context;
use crate::event::{Command, Event};
use crate::executor::{ActionInput, Services};
use crate::gateway::{Interpreter, ScanGate};
use crate::history::TransitionHistory;
use crate::normalizer::{ScannerEvent, normalize};
use crate::state::State;
use crate::status::{PrecinctScannerStatus, project};
use crate::transition::{Policy, step};
use precinct_hardware::{ScannerClient, ScannerConnector, watch_status};
use precinct_store::SheetStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Message on the controller queue.
#[derive(Debug)]
pub(crate) enum Envelope {
    Event { epoch: u64, event: Event },
    Command(Command),
    Shutdown,
}

pub(crate) type EventSender = mpsc::UnboundedSender<Envelope>;

pub(crate) struct Runner<C, I, S, G> {
    pub services: Arc<Services<C, I, S, G>>,
    pub config: MachineConfig,
    pub policy: Policy,
    pub state: State,
    pub ctx: Context,
    pub epoch: u64,
    pub activities: JoinSet<()>,
    pub sender: EventSender,
    pub receiver: mpsc::UnboundedReceiver<Envelope>,
    pub status: watch::Sender<PrecinctScannerStatus>,
    pub changes: broadcast::Sender<PrecinctScannerStatus>,
    pub history: TransitionHistory,
}

impl<C, I, S, G> Runner<C, I, S, G>
where
    C: ScannerConnector,
    I: Interpreter,
    S: SheetStore,
    G: ScanGate,
{
    pub(crate) async fn run(mut self) {
        match self.services.store.ballots_counted().await {
            Ok(count) => self.ctx.ballots_counted = count,
            Err(e) => error!("Could not read ballot count, starting from zero: {}", e),
        }

        info!("Scanner controller starting in {}", self.state);
        self.start_activities();
        self.publish();

        while let Some(envelope) = self.receiver.recv().await {
            let event = match envelope {
                Envelope::Shutdown => break,
                Envelope::Command(command) => Event::Command(command),
                Envelope::Event { epoch, event } if epoch == self.epoch => event,
                Envelope::Event { epoch, event } => {
                    debug!(
                        "Discarding stale {} from epoch {} (now {} in {})",
                        event, epoch, self.epoch, self.state
                    );
                    continue;
                }
            };
            self.handle(event).await;
        }

        self.activities.abort_all();
        if let Some(client) = self.ctx.client.take() {
            if let Ok(mut guard) = client.try_lock() {
                if let Err(e) = guard.disconnect().await {
                    warn!("Error disconnecting scanner on shutdown: {}", e);
                }
            }
        }
        info!("Scanner controller stopped in {}", self.state);
    }

    async fn handle(&mut self, event: Event) {
        let label = event.to_string();
        debug!("Event in {}: {}", self.state, label);

        if matches!(event, Event::Command(Command::Accept)) {
            let settings = self.services.scanner_settings().await;
            self.policy.shoeshine_mode = settings.is_shoeshine_mode_enabled;
        }

        let before = self.ctx.summary();
        let step = step(&self.state, &mut self.ctx, event, &self.policy);
        for change in self.ctx.summary().changes_since(&before) {
            debug!("Context {}", change);
        }

        for effect in &step.effects {
            if let Err(e) = self.services.record(effect).await {
                error!("Failed to record sheet {}: {}", effect.sheet_id(), e);
            }
        }

        if step.entered {
            info!("Transition: {} -> {} on {}", self.state, step.state, label);
            self.history.record(self.state, step.state, label);
            self.state = step.state;
            self.start_activities();
        }
        self.publish();
    }

    /// Cancel the previous state's activities and start the current one's.
    fn start_activities(&mut self) {
        // Dropping a JoinSet aborts every task in it.
        self.activities = JoinSet::new();
        self.epoch += 1;
        let epoch = self.epoch;
        let plan = self.state.entry_plan();

        for timer in plan.timers {
            let delay = self.config.delays.timer(timer);
            let sender = self.sender.clone();
            self.activities.spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = sender.send(Envelope::Event {
                    epoch,
                    event: Event::Timer(timer),
                });
            });
        }

        if let Some(rate) = plan.poll {
            self.start_watcher(epoch, rate);
        }

        if let Some(action) = plan.action {
            let input = ActionInput {
                client: self.ctx.client.clone(),
                sheet: self.ctx.scanned_sheet.clone(),
            };
            let services = Arc::clone(&self.services);
            let sender = self.sender.clone();
            let task = async move {
                let outcome = services.execute(action, input).await;
                let _ = sender.send(Envelope::Event {
                    epoch,
                    event: Event::Action(outcome),
                });
            };

            if action == Action::Scan {
                tokio::spawn(task);
            } else {
                self.activities.spawn(task);
            }
        }
    }

    fn start_watcher(&mut self, epoch: u64, rate: PollRate) {
        let sender = self.sender.clone();
        let Some(client) = self.ctx.client.clone() else {
            warn!("No scanner connection to watch in {}", self.state);
            let _ = sender.send(Envelope::Event {
                epoch,
                event: Event::Scanner(ScannerEvent::Disconnected),
            });
            return;
        };

        let watch_config = self.config.delays.watch_config(rate == PollRate::DuringAccept);
        self.activities.spawn(async move {
            watch_status(client, watch_config, move |reading| match normalize(&reading) {
                Ok(event) => sender
                    .send(Envelope::Event {
                        epoch,
                        event: Event::Scanner(event),
                    })
                    .is_ok(),
                Err(kind) => {
                    warn!("Paper status watcher stopped: {}", kind);
                    let _ = sender.send(Envelope::Event {
                        epoch,
                        event: Event::StatusFailed(kind),
                    });
                    false
                }
            })
            .await;
        });
    }

    fn publish(&mut self) {
        let status = project(&self.state, &self.ctx);
        if *self.status.borrow() != status {
            debug!("Status: {:?}", status.state);
            self.status.send_replace(status.clone());
            let _ = self.changes.send(status);
        }
    }
}
