//! The version-state coordinator.
//!
//! Owns all mutable session state and runs the four single-flight
//! operations: fetch, download, delete, and apply/reset. Each
//! operation follows the same template: reject re-entry if the
//! category flag is set, set the flag and clear the category's prior
//! error, perform the steps (crossing into `spawn_blocking` at every
//! file/network boundary), and clear the flag on every exit path.
//!
//! The coordinator never directly assigns "applied = the version I
//! just applied": after every apply or reset the applied state is
//! re-derived from the file's new content hash, so any mismatch
//! between intent and actual result surfaces as a detectable
//! inconsistency instead of being masked.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backup;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::files::{self, FileManagerService};
use crate::identity;
use crate::net::NetworkService;
use crate::patch;
use crate::session::{OpCategory, SessionSnapshot, SessionState};
use crate::version::{sanitize, VersionEntry, VersionLayout};

/// Stages of the unified apply/reset operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStage {
    /// Removing previously injected logic objects.
    RemovingPriorLogic,
    /// Restoring the pristine backup (reset flow).
    RestoringBackup,
    /// Combining base and patch bytes (apply flow).
    Patching,
    /// Reapplying auxiliary binding assets and logic packages.
    ReapplyingAssets,
    /// Recomputing identity and applied state from content.
    RederivingState,
}

impl ApplyStage {
    /// Human-readable stage name for logging and progress display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemovingPriorLogic => "Removing prior logic",
            Self::RestoringBackup => "Restoring backup",
            Self::Patching => "Patching",
            Self::ReapplyingAssets => "Reapplying assets",
            Self::RederivingState => "Re-deriving state",
        }
    }
}

/// Run a closure on the blocking pool, mapping panics/aborts to
/// [`EngineError::Internal`].
async fn run_blocking<T, F>(f: F) -> EngineResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::Internal(e.to_string()))
}

/// RAII guard for a single-flight flag.
///
/// Dropping the guard clears the flag and notifies observers, which
/// covers every exit path of an operation, including early returns
/// and errors.
struct OpGuard<'a> {
    coordinator: &'a VersionCoordinator,
    category: OpCategory,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.state.lock().finish(self.category);
        self.coordinator.publish();
    }
}

/// Orchestrator for the patch lifecycle of one target asset file.
pub struct VersionCoordinator {
    config: EngineConfig,
    layout: VersionLayout,
    net: Arc<dyn NetworkService>,
    files: Arc<dyn FileManagerService>,
    state: Mutex<SessionState>,
    events: watch::Sender<SessionSnapshot>,
}

impl VersionCoordinator {
    /// Create a coordinator over the given services.
    pub fn new(
        config: EngineConfig,
        net: Arc<dyn NetworkService>,
        files: Arc<dyn FileManagerService>,
    ) -> Self {
        let layout = VersionLayout::new(&config.data_dir);
        let (events, _) = watch::channel(SessionSnapshot::default());
        Self {
            config,
            layout,
            net,
            files,
            state: Mutex::new(SessionState::default()),
            events,
        }
    }

    /// The on-disk layout used for version payloads.
    pub fn layout(&self) -> &VersionLayout {
        &self.layout
    }

    /// Current snapshot of the session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().snapshot()
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    /// Record a UI selection for the next download/apply.
    pub fn select_version(&self, version: Option<VersionEntry>) {
        self.state.lock().selected_version = version;
        self.publish();
    }

    /// Look up a catalog entry by version string.
    pub fn find_version(&self, version: &str) -> Option<VersionEntry> {
        let state = self.state.lock();
        state
            .catalog
            .as_ref()?
            .versions
            .iter()
            .find(|v| v.version == version)
            .cloned()
    }

    /// All catalog entries in server order, or empty before a fetch.
    pub fn catalog_versions(&self) -> Vec<VersionEntry> {
        self.state
            .lock()
            .catalog
            .as_ref()
            .map(|c| c.versions.clone())
            .unwrap_or_default()
    }

    fn publish(&self) {
        let snapshot = self.state.lock().snapshot();
        self.events.send_replace(snapshot);
    }

    fn begin(&self, category: OpCategory) -> EngineResult<OpGuard<'_>> {
        self.state.lock().begin(category)?;
        self.publish();
        Ok(OpGuard {
            coordinator: self,
            category,
        })
    }

    fn record_error(&self, category: OpCategory, error: &EngineError) {
        self.state.lock().set_error(category, error.to_string());
        self.publish();
    }

    /// Fetch the remote catalog for the target file's identity hash.
    ///
    /// With no identity hash available the catalog and all derived
    /// state are cleared rather than guessed. On fetch failure the
    /// error is recorded for the fetch category and the stale catalog
    /// is discarded.
    pub async fn fetch(&self, token: &str) -> EngineResult<()> {
        let _guard = self.begin(OpCategory::Fetch)?;

        let target = self.config.target_file.clone();
        let identity = run_blocking(move || identity::identity_hash(&target)).await??;

        let Some(identity) = identity else {
            let mut state = self.state.lock();
            state.clear_derived();
            drop(state);
            self.publish();
            info!("no identity hash available; cleared catalog and applied state");
            return Ok(());
        };

        self.state.lock().identity_hash = Some(identity.clone());

        let net = Arc::clone(&self.net);
        let id = identity.clone();
        let tok = token.to_string();
        let fetched = run_blocking(move || net.fetch_catalog(&id, &tok)).await?;

        match fetched {
            Ok(catalog) => {
                let target = self.config.target_file.clone();
                let current = run_blocking(move || identity::current_hash(&target)).await??;

                let layout = self.layout.clone();
                let mut state = self.state.lock();
                state.catalog = Some(catalog);
                state.current_file_hash = current.clone();

                let resolved =
                    identity::resolve_applied(current.as_deref(), state.catalog.as_ref()).cloned();
                state.update_applied(resolved);

                let selection = state.catalog.as_ref().and_then(|catalog| {
                    catalog.select(
                        state.selected_version.as_ref(),
                        state.applied_version.as_ref(),
                        |v| layout.is_downloaded(v),
                    )
                });
                state.selected_version = selection;
                let count = state.catalog.as_ref().map(|c| c.versions.len()).unwrap_or(0);
                drop(state);

                self.publish();
                info!(versions = count, "catalog fetched");
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.set_error(OpCategory::Fetch, e.to_string());
                state.catalog = None;
                state.update_applied(None);
                drop(state);
                self.publish();
                Err(e)
            }
        }
    }

    /// Download a version's patch archive and install its payload.
    ///
    /// Temporary files are removed on every exit path. When
    /// `apply_after` is set and extraction succeeded, chains into
    /// [`Self::apply`] for the downloaded version after any pending
    /// external refresh settles.
    pub async fn download(
        &self,
        version: VersionEntry,
        apply_after: bool,
        token: &str,
        cancel: CancellationToken,
    ) -> EngineResult<()> {
        let _guard = self.begin(OpCategory::Download)?;
        info!(version = %version.version, "starting download");

        let identity = match self.state.lock().identity_hash.clone() {
            Some(id) => id,
            None => {
                let target = self.config.target_file.clone();
                match run_blocking(move || identity::identity_hash(&target)).await?? {
                    Some(id) => id,
                    None => {
                        let e = EngineError::IdentityUnavailable;
                        self.record_error(OpCategory::Download, &e);
                        return Err(e);
                    }
                }
            }
        };

        let staging = &self.config.staging_dir;
        let tag = format!(
            "{}-{}",
            sanitize(&version.base_version_id),
            sanitize(&version.version)
        );
        let archive = staging.join(format!("{}.tar.gz", tag));
        let extract_tmp = staging.join(format!("{}-extract", tag));
        let dest = self.layout.version_dir(&version);

        let result = self
            .download_inner(&version, &identity, token, &archive, &extract_tmp, &dest, &cancel)
            .await;

        // Temp files go away regardless of the outcome; failures here
        // are logged inside cleanup_temp and do not change the result.
        let (a, t) = (archive.clone(), extract_tmp.clone());
        let _ = run_blocking(move || {
            files::cleanup_temp(&a);
            files::cleanup_temp(&t);
        })
        .await;

        if let Err(e) = result {
            self.record_error(OpCategory::Download, &e);
            return Err(e);
        }
        info!(version = %version.version, "download complete");

        if apply_after {
            let fm = Arc::clone(&self.files);
            run_blocking(move || fm.wait_for_refresh()).await?;
            self.run_apply(Some(version), false).await?;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn download_inner(
        &self,
        version: &VersionEntry,
        identity: &str,
        token: &str,
        archive: &Path,
        extract_tmp: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let net = Arc::clone(&self.net);
        let (v, id, tok, arch, c) = (
            version.clone(),
            identity.to_string(),
            token.to_string(),
            archive.to_path_buf(),
            cancel.clone(),
        );
        let bytes = run_blocking(move || net.download_archive(&v, &id, &tok, &arch, &c)).await??;
        debug!(bytes, "archive downloaded");

        let fm = Arc::clone(&self.files);
        let (arch, tmp, dst) = (
            archive.to_path_buf(),
            extract_tmp.to_path_buf(),
            dest.to_path_buf(),
        );
        run_blocking(move || fm.extract_and_move(&arch, &tmp, &dst)).await??;

        self.files.request_refresh();
        Ok(())
    }

    /// Delete a version's local payload storage.
    pub async fn delete(&self, version: VersionEntry) -> EngineResult<()> {
        let _guard = self.begin(OpCategory::Delete)?;

        let path = self.layout.version_dir(&version);
        info!(version = %version.version, path = %path.display(), "deleting version payload");

        let fm = Arc::clone(&self.files);
        let p = path.clone();
        let result = run_blocking(move || fm.delete_version_folder(&p)).await?;
        self.files.request_refresh();

        if let Err(e) = result {
            self.record_error(OpCategory::Delete, &e);
            return Err(e);
        }
        Ok(())
    }

    /// Apply a version's patch to the target file.
    ///
    /// With `version` of `None` the session's selected version is
    /// used. Requires the patch payload to exist locally; ensures a
    /// pristine backup exists before the first write.
    pub async fn apply(&self, version: Option<VersionEntry>) -> EngineResult<()> {
        self.run_apply(version, false).await
    }

    /// Revert the target file to its pristine backup.
    pub async fn reset(&self) -> EngineResult<()> {
        self.run_apply(None, true).await
    }

    async fn run_apply(&self, version: Option<VersionEntry>, is_reset: bool) -> EngineResult<()> {
        let _guard = self.begin(OpCategory::Apply)?;

        let result = self.apply_stages(version, is_reset).await;
        if let Err(e) = &result {
            self.state.lock().set_error(OpCategory::Apply, e.to_string());
            self.publish();
        }
        result
    }

    async fn apply_stages(&self, version: Option<VersionEntry>, is_reset: bool) -> EngineResult<()> {
        // Prior logic is removed unconditionally, before the file is
        // touched: if an earlier run was interrupted after
        // instantiation, a second instantiation must not duplicate it.
        info!(stage = ApplyStage::RemovingPriorLogic.name(), is_reset, "apply operation started");
        let fm = Arc::clone(&self.files);
        let root = self.config.hierarchy_root.clone();
        run_blocking(move || fm.remove_existing_logic(&root)).await??;

        let target = self.config.target_file.clone();
        if !target.is_file() {
            info!("target file could not be resolved; nothing to do");
            return Ok(());
        }

        let mut aux_version = version;

        if is_reset {
            info!(stage = ApplyStage::RestoringBackup.name(), "restoring pristine content");
            let fm = Arc::clone(&self.files);
            let t = target.clone();
            run_blocking(move || fm.restore_backup(&t)).await??;
        } else {
            let chosen = match aux_version
                .take()
                .or_else(|| self.state.lock().selected_version.clone())
            {
                Some(v) => v,
                None => return Err(EngineError::NoVersionSelected),
            };

            info!(stage = ApplyStage::Patching.name(), version = %chosen.version, "patching target");
            let payload = self.layout.patch_payload(&chosen);
            let fm = Arc::clone(&self.files);
            let t = target.clone();
            let step = run_blocking(move || -> EngineResult<()> {
                if !payload.is_file() {
                    // Fail fast before the target file is touched.
                    return Err(EngineError::MissingArtifact(payload));
                }

                if !fm.backup_exists(&t) {
                    // Assumes current content is still pristine; a
                    // file edited outside the engine would be backed
                    // up as-is (documented risk).
                    fm.create_backup(&t)?;
                }

                let backup_file = backup::backup_path(&t);
                let base =
                    fs::read(&backup_file).map_err(|e| EngineError::io("read", &backup_file, e))?;
                let patch_bytes =
                    fs::read(&payload).map_err(|e| EngineError::io("read", &payload, e))?;

                let combined = patch::apply(&base, &patch_bytes);
                fs::write(&t, combined).map_err(|e| EngineError::io("write", &t, e))?;
                Ok(())
            })
            .await?;

            if let Err(e) = step {
                self.rollback_after_failed_apply(&target, &e).await;
                return Err(e);
            }

            aux_version = Some(chosen);
        }

        info!(stage = ApplyStage::ReapplyingAssets.name(), "reapplying auxiliary assets");
        let fm = Arc::clone(&self.files);
        run_blocking(move || fm.wait_for_refresh()).await?;

        // For a reset with no applied version on record, the session's
        // selection decides which auxiliary asset set to reapply.
        let aux_version = aux_version.or_else(|| {
            let state = self.state.lock();
            state
                .applied_version
                .clone()
                .or_else(|| state.selected_version.clone())
        });

        if let Some(v) = &aux_version {
            self.reapply_assets(v, is_reset, &target).await?;
        } else {
            debug!("no version context for auxiliary assets; skipping");
        }

        info!(stage = ApplyStage::RederivingState.name(), "re-deriving applied state");
        self.rederive_state().await?;
        Ok(())
    }

    /// Best-effort restore after a failed apply. The target must
    /// never be left half-written while the original is recoverable.
    async fn rollback_after_failed_apply(&self, target: &Path, cause: &EngineError) {
        if matches!(cause, EngineError::MissingArtifact(_)) {
            // Nothing was written; no rollback needed.
            return;
        }

        let fm = Arc::clone(&self.files);
        let t = target.to_path_buf();
        let _ = run_blocking(move || {
            if fm.backup_exists(&t) {
                if let Err(e) = fm.restore_backup(&t) {
                    warn!(error = %e, "rollback restore failed; target may be inconsistent");
                } else {
                    info!("rolled back target to pristine backup after failed apply");
                }
            }
        })
        .await;
    }

    async fn reapply_assets(
        &self,
        version: &VersionEntry,
        is_reset: bool,
        target: &Path,
    ) -> EngineResult<()> {
        let asset = self.layout.avatar_asset(version, !is_reset);
        if asset.is_file() {
            let fm = Arc::clone(&self.files);
            let (root, t) = (self.config.hierarchy_root.clone(), target.to_path_buf());
            run_blocking(move || fm.apply_auxiliary_asset(&root, &t, &asset)).await??;
        } else {
            debug!(asset = %asset.display(), "auxiliary avatar asset not present; skipping");
        }

        if !is_reset {
            let package = self.layout.logic_package(version);
            if package.is_file() {
                let fm = Arc::clone(&self.files);
                let root = self.config.hierarchy_root.clone();
                run_blocking(move || fm.instantiate_logic_package(&package, &root)).await??;
            }
        }

        // Version-specific custom logic applies to both flows.
        let custom = self.layout.custom_logic(version);
        if custom.is_file() {
            let fm = Arc::clone(&self.files);
            let root = self.config.hierarchy_root.clone();
            run_blocking(move || fm.instantiate_logic_package(&custom, &root)).await??;
        }

        Ok(())
    }

    /// Recompute identity and applied state from file content.
    async fn rederive_state(&self) -> EngineResult<()> {
        let target = self.config.target_file.clone();
        let (identity, current) =
            run_blocking(move || -> EngineResult<(Option<String>, Option<String>)> {
                Ok((
                    identity::identity_hash(&target)?,
                    identity::current_hash(&target)?,
                ))
            })
            .await??;

        let mut state = self.state.lock();
        state.identity_hash = identity;
        state.current_file_hash = current.clone();
        let resolved =
            identity::resolve_applied(current.as_deref(), state.catalog.as_ref()).cloned();
        let changed = state.update_applied(resolved);
        drop(state);

        self.publish();
        debug!(changed, "applied state re-derived from content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_stage_names() {
        assert_eq!(ApplyStage::RemovingPriorLogic.name(), "Removing prior logic");
        assert_eq!(ApplyStage::RestoringBackup.name(), "Restoring backup");
        assert_eq!(ApplyStage::Patching.name(), "Patching");
        assert_eq!(ApplyStage::ReapplyingAssets.name(), "Reapplying assets");
        assert_eq!(ApplyStage::RederivingState.name(), "Re-deriving state");
    }

    #[test]
    fn test_apply_stage_equality() {
        assert_eq!(ApplyStage::Patching, ApplyStage::Patching);
        assert_ne!(ApplyStage::Patching, ApplyStage::RestoringBackup);
    }
}
