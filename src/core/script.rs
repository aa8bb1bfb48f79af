use crate::config::toml_config::CleanerConfig;
use crate::core::coordinator::Coordinator;
use crate::domain::model::{
    CleanState, Command, CommandAck, MutationBatch, ReloadOutcome, RetryToken,
};
use crate::domain::ports::{PageHost, PreferenceStore, QueuedDelivery};
use crate::utils::error::{CleanerError, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::time::Duration;

/// The content script's top level: startup check, command handling, and
/// delivery of host callbacks to the coordinator.
///
/// The coordinator borrow is never held across an `.await`, so deliveries
/// that arrive while a command waits on storage still get through.
pub struct ContentScript<H: PageHost, S: PreferenceStore> {
    coordinator: Rc<RefCell<Coordinator<H>>>,
    store: Rc<S>,
    max_pump_rounds: usize,
}

impl<H: PageHost, S: PreferenceStore> Clone for ContentScript<H, S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Rc::clone(&self.coordinator),
            store: Rc::clone(&self.store),
            max_pump_rounds: self.max_pump_rounds,
        }
    }
}

impl<H: PageHost, S: PreferenceStore> ContentScript<H, S> {
    pub fn new(host: H, store: S, config: &CleanerConfig) -> Self {
        Self {
            coordinator: Rc::new(RefCell::new(Coordinator::new(host, config))),
            store: Rc::new(store),
            max_pump_rounds: config.runtime.max_pump_rounds,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn coordinator(&self) -> Ref<'_, Coordinator<H>> {
        self.coordinator.borrow()
    }

    pub fn coordinator_mut(&self) -> RefMut<'_, Coordinator<H>> {
        self.coordinator.borrow_mut()
    }

    pub fn state(&self) -> CleanState {
        self.coordinator.borrow().state()
    }

    /// Reads the persisted preferences and restores clean mode if it was on.
    pub async fn boot(&self) -> Result<CleanState> {
        let prefs = self.store.load().await?;
        tracing::info!(
            "Stored preferences: clean mode {}, font {:?}",
            prefs.clean_mode_enabled,
            prefs.font_size_px
        );
        Ok(self.coordinator.borrow_mut().restore(&prefs))
    }

    pub async fn handle_command(&self, command: Command) -> Result<CommandAck> {
        tracing::debug!("Command received: {:?}", command);

        match command {
            Command::Enable => {
                self.coordinator.borrow_mut().enable();
                let prefs = self.store.load().await?;
                self.coordinator.borrow_mut().apply_font(prefs.font_size_px);
            }
            Command::Disable => {
                let outcome = self.coordinator.borrow_mut().disable();
                if outcome == ReloadOutcome::Restarted {
                    self.boot().await?;
                }
            }
            Command::UpdateFont(size) => {
                self.coordinator.borrow_mut().update_font(size);
            }
        }

        Ok(CommandAck {
            ok: true,
            state: self.state(),
        })
    }

    /// Decodes a raw `{ action, value }` message. Unknown actions are
    /// acknowledged with `ok: false` and otherwise ignored.
    pub async fn handle_message(&self, message: serde_json::Value) -> Result<CommandAck> {
        match Command::from_value(message) {
            Ok(command) => self.handle_command(command).await,
            Err(CleanerError::UnknownAction { action }) => {
                tracing::warn!("Ignoring message with unknown action: {}", action);
                Ok(CommandAck {
                    ok: false,
                    state: self.state(),
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn on_mutations(&self, batch: MutationBatch<H::Node>) {
        match self.coordinator.try_borrow_mut() {
            Ok(mut coordinator) => coordinator.on_mutations(batch),
            Err(_) => tracing::warn!(
                "Dropping mutation delivery for {:?}: coordinator busy",
                batch.subscription
            ),
        }
    }

    pub fn on_retry(&self, token: RetryToken) {
        match self.coordinator.try_borrow_mut() {
            Ok(mut coordinator) => coordinator.on_retry(token),
            Err(_) => tracing::warn!("Dropping retry {:?}: coordinator busy", token),
        }
    }
}

impl<H, S> ContentScript<H, S>
where
    H: PageHost + QueuedDelivery,
    S: PreferenceStore,
{
    /// Delivers queued batches until the page stops mutating. Returns the
    /// number of rounds that delivered something.
    pub fn pump(&self) -> Result<usize> {
        for round in 0..self.max_pump_rounds {
            let batches = self.coordinator.borrow_mut().host_mut().take_batches();
            if batches.is_empty() {
                return Ok(round);
            }
            for batch in batches {
                self.on_mutations(batch);
            }
        }

        let rounds = self.max_pump_rounds;
        if !self.coordinator.borrow().host().has_pending_batches() {
            return Ok(rounds);
        }
        tracing::error!("Mutation deliveries did not settle after {} rounds", rounds);
        Err(CleanerError::MutationLoop { rounds })
    }

    /// Advances the host clock, fires due retries, then pumps.
    pub fn advance(&self, by: Duration) -> Result<usize> {
        let due = self.coordinator.borrow_mut().host_mut().advance_clock(by);
        let fired = due.len();
        for token in due {
            self.on_retry(token);
            self.pump()?;
        }
        self.pump()?;
        Ok(fired)
    }
}
