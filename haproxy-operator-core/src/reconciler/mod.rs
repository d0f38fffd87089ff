//! The single reconcile loop.
//!
//! Every event runs the same pass: assemble state from the snapshot,
//! materialize certificates, render, validate a candidate file, swap it in,
//! reload, then publish provider data. A pass with unchanged input writes no
//! file and does not reload. When the reload fails every file the pass
//! touched goes back to its previous contents, so the next pass sees a
//! difference and reloads again.

mod backup;
mod error;
mod outcome;
mod publish;

#[cfg(test)]
mod tests;

pub use error::ReconcileError;
pub use outcome::{DatabagScope, DatabagWrite, ReconcileOutcome};

use backup::Backup;
use crate::host::{FileSystem, HaproxyService, PUBLIC_FILE_MODE, write_if_changed};
use crate::model::{Event, ModelSnapshot, UnitStatus};
use crate::render::{FFDHE2048, RenderError, RenderedConfig, Renderer};
use crate::settings::OperatorSettings;
use crate::state::{ProxyState, assemble};
use crate::tls::{self, PRIVATE_KEY_SECRET};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct Reconciler<F, S> {
    settings: OperatorSettings,
    fs: F,
    service: S,
    renderer: Renderer,
    // One pass at a time.
    lock: Mutex<()>,
}

impl<F: FileSystem, S: HaproxyService> Reconciler<F, S> {
    pub fn new(settings: OperatorSettings, fs: F, service: S) -> Result<Self, RenderError> {
        Ok(Self {
            settings,
            fs,
            service,
            renderer: Renderer::new()?,
            lock: Mutex::new(()),
        })
    }

    pub fn settings(&self) -> &OperatorSettings {
        &self.settings
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run one reconcile for `event`. Failures end up in the returned
    /// status; nothing here aborts the process.
    pub async fn handle(&self, event: &Event, snapshot: ModelSnapshot) -> ReconcileOutcome {
        let _guard = self.lock.lock().await;
        let mut outcome = ReconcileOutcome::new(event.to_string());
        info!(event = %event, "reconciling");

        if let Err(e) = self.run(event, snapshot, &mut outcome).await {
            warn!(event = %event, error = %e, "reconcile failed");
            outcome.status = e.status();
        }

        info!(
            event = %event,
            status = %outcome.status,
            files_written = outcome.files_written.len(),
            reloaded = outcome.reloaded,
            "reconcile finished"
        );
        outcome
    }

    async fn run(
        &self,
        event: &Event,
        snapshot: ModelSnapshot,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), ReconcileError> {
        if event.requires_install() && !self.service.is_installed().await? {
            info!(package = self.settings.package_name.as_str(), "installing haproxy");
            self.service.install().await.map_err(ReconcileError::Install)?;
        }

        let snapshot = match event.departing_relation() {
            Some(id) => snapshot.without_relation(id),
            None => snapshot,
        };

        let state = assemble(&snapshot, &self.settings);
        outcome.rejections = state.requirers.rejections.clone();
        if let Some(message) = &state.blocking {
            warn!(reason = message.as_str(), "configuration blocked");
            outcome.status = UnitStatus::Blocked(message.clone());
            return Ok(());
        }

        let plan = tls::plan(&snapshot, &state)?;
        if plan.new_private_key
            && let Some(key) = &plan.private_key
        {
            outcome
                .new_secrets
                .insert(PRIVATE_KEY_SECRET.to_string(), key.clone());
        }

        let backup = Backup::take(&self.fs, &self.settings)?;
        let materialized = tls::materialize(&self.fs, &self.settings, &plan, &state.ca_certificates)?;
        let mut changed = materialized.changed();
        materialized.written.into_iter().for_each(|p| outcome.wrote(p));
        outcome.files_removed.extend(materialized.removed);

        let tls_enabled = !materialized.certificates.is_empty();
        let rendered = self
            .renderer
            .render(&snapshot, &self.settings, &state, tls_enabled)?;
        changed |= self.write_auxiliary_files(&rendered, outcome)?;
        changed |= self.apply_config(&rendered, outcome).await?;

        if changed || !self.service.is_active().await? {
            if let Err(e) = self.reload().await {
                self.roll_back(&backup, outcome);
                return Err(e);
            }
            outcome.reloaded = true;
        }

        outcome.databag_writes = publish::databag_writes(&snapshot, &state, &plan)?;
        outcome.status = Self::final_status(&state, plan.waiting_message());
        Ok(())
    }

    fn final_status(state: &ProxyState, waiting: Option<String>) -> UnitStatus {
        if let Some(message) = waiting {
            return UnitStatus::Active(message);
        }
        let invalid = state.requirers.relation_ids_with_invalid_data.len()
            + state.requirers.relation_ids_with_invalid_data_tcp.len();
        if invalid > 0 {
            info!(invalid, "some requirers were rejected");
        }
        UnitStatus::active()
    }

    /// DH parameters and the SPOE agent file. Returns whether anything
    /// changed on disk.
    fn write_auxiliary_files(
        &self,
        rendered: &RenderedConfig,
        outcome: &mut ReconcileOutcome,
    ) -> Result<bool, ReconcileError> {
        let owner = Some(self.settings.haproxy_user.as_str());
        let mut changed = false;

        let dhparam = self.settings.dhparam_path();
        if write_if_changed(&self.fs, &dhparam, FFDHE2048.as_bytes(), owner)? {
            outcome.wrote(dhparam);
            changed = true;
        }

        let spoe_path = self.settings.spoe_auth_path();
        match &rendered.spoe_auth {
            Some(contents) => {
                if write_if_changed(&self.fs, &spoe_path, contents.as_bytes(), owner)? {
                    outcome.wrote(spoe_path);
                    changed = true;
                }
            }
            None => {
                if self.fs.remove(&spoe_path)? {
                    outcome.files_removed.push(spoe_path);
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    /// Validate the rendered configuration as a candidate file and move it
    /// over the live one. A refused candidate never replaces the live file.
    async fn apply_config(
        &self,
        rendered: &RenderedConfig,
        outcome: &mut ReconcileOutcome,
    ) -> Result<bool, ReconcileError> {
        let live = self.settings.config_path();
        let contents = rendered.haproxy_cfg.as_bytes();
        if self.fs.read(&live)?.as_deref() == Some(contents) {
            return Ok(false);
        }

        let candidate = self.settings.candidate_path();
        let owner = Some(self.settings.haproxy_user.as_str());
        self.fs.write(&candidate, contents, PUBLIC_FILE_MODE, owner)?;

        if let Err(e) = self
            .service
            .validate_config(&candidate, self.settings.validate_timeout())
            .await
        {
            warn!(error = %e, summary = e.summary().as_str(), "configuration refused");
            self.fs.remove(&candidate)?;
            return Err(ReconcileError::InvalidConfig(e));
        }

        self.fs.rename(&candidate, &live)?;
        info!(path = %live.display(), "configuration updated");
        outcome.wrote(live);
        Ok(true)
    }

    /// Undo the writes of a pass whose reload failed. A restore failure is
    /// logged; the reload error is what the pass reports.
    fn roll_back(&self, backup: &Backup, outcome: &mut ReconcileOutcome) {
        let owner = Some(self.settings.haproxy_user.as_str());
        let touched = outcome
            .files_written
            .iter()
            .chain(outcome.files_removed.iter())
            .map(PathBuf::as_path);
        match backup.restore(&self.fs, touched, owner) {
            Ok(restored) => {
                warn!(restored, "reload failed, previous files restored");
                outcome.files_written.clear();
                outcome.files_removed.clear();
            }
            Err(e) => warn!(error = %e, "failed to restore files after a failed reload"),
        }
    }

    async fn reload(&self) -> Result<(), ReconcileError> {
        let attempts = self.settings.reload_retries + 1;
        let mut attempt = 1;
        loop {
            match self.service.reload().await {
                Ok(()) => break,
                Err(e) if attempt < attempts => {
                    warn!(attempt, error = %e, "haproxy reload failed, retrying");
                    attempt += 1;
                }
                Err(source) => return Err(ReconcileError::Reload { attempts, source }),
            }
        }

        if !self.service.is_active().await? {
            return Err(ReconcileError::NotRunning);
        }
        info!("haproxy reloaded");
        Ok(())
    }
}
