//! Deploy and cleanup of one kpt package.

use std::io::Write;
use std::path::Path;

use crate::cancel::CancelToken;
use crate::config::{DeployerConfig, KptDeploy, RunOptions};
use crate::error::DeployError;
use crate::events::{DeployEvent, EventSink, TracingEventSink};
use crate::inventory::{DesiredInventory, InventoryReconciler, ReconcileReport};
use crate::kpt::{Kpt, KptCli};
use crate::manifest::{ManifestList, ManifestNamespaces, NamespaceCollector};

use super::artifacts::{Artifact, ImageList};

/// Runs `kpt live apply`/`destroy` for a package after reconciling its
/// Kptfile.
///
/// Reconcile, apply and destroy failures abort. Failing to render manifests
/// or collect namespaces only degrades auxiliary features, so those become
/// info events and the deploy continues.
pub struct Deployer {
    deploy: KptDeploy,
    desired: DesiredInventory,
    kpt: Box<dyn Kpt>,
    events: Box<dyn EventSink>,
    namespaces: Box<dyn NamespaceCollector>,
    pod_selector: ImageList,
}

impl Deployer {
    /// `namespace` is the per-run (kube context) namespace; empty for none.
    pub fn new(deploy: KptDeploy, namespace: impl Into<String>, kpt: Box<dyn Kpt>) -> Self {
        let desired = DesiredInventory {
            name: deploy.name.clone(),
            inventory_id: deploy.inventory_id.clone(),
            namespace: namespace.into(),
            inventory_namespace: deploy.inventory_namespace.clone(),
            force: deploy.force,
            extra_flags: deploy.flags.clone(),
        };
        Self {
            deploy,
            desired,
            kpt,
            events: Box::new(TracingEventSink),
            namespaces: Box::new(ManifestNamespaces),
            pod_selector: ImageList::new(),
        }
    }

    /// Build a deployer backed by the configured kpt binary.
    pub fn from_config(config: DeployerConfig, options: &RunOptions) -> Self {
        let DeployerConfig {
            kpt_binary,
            mut deploy,
        } = config;
        options.apply_to(&mut deploy);
        Self::new(deploy, options.namespace(), Box::new(KptCli::new(kpt_binary)))
    }

    pub fn with_event_sink(mut self, events: Box<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_namespace_collector(mut self, namespaces: Box<dyn NamespaceCollector>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn apply_dir(&self) -> &Path {
        &self.deploy.dir
    }

    pub fn desired_inventory(&self) -> &DesiredInventory {
        &self.desired
    }

    /// Images registered by successful deploys.
    pub fn pod_selector(&self) -> &ImageList {
        &self.pod_selector
    }

    /// Make sure the Kptfile exists and carries the desired inventory.
    pub fn reconcile(
        &self,
        out: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<ReconcileReport, DeployError> {
        InventoryReconciler::new(self.kpt.as_ref(), &self.desired)
            .with_events(self.events.as_ref())
            .reconcile(&self.deploy.dir, out, cancel)
    }

    /// Deploy the package and return the namespaces its manifests target.
    pub fn deploy(
        &mut self,
        out: &mut dyn Write,
        cancel: &CancelToken,
        builds: &[Artifact],
    ) -> Result<Vec<String>, DeployError> {
        self.reconcile(out, cancel)?;

        let manifests = {
            let _span = tracing::info_span!("read_manifests").entered();
            self.read_manifests(cancel).unwrap_or_else(|err| {
                self.events.emit(DeployEvent::info(&err));
                ManifestList::new()
            })
        };

        let namespaces = {
            let _span = tracing::info_span!("collect_namespaces").entered();
            self.namespaces.collect(&manifests).unwrap_or_else(|err| {
                self.events.emit(DeployEvent::info(&err));
                Vec::new()
            })
        };

        {
            let _span =
                tracing::info_span!("live_apply", dir = %self.deploy.dir.display()).entered();
            let flags: Vec<String> = self
                .deploy
                .flags
                .iter()
                .chain(&self.deploy.apply_flags)
                .cloned()
                .collect();
            self.kpt
                .live_apply(&self.deploy.dir, &flags, out, cancel)
                .map_err(|source| DeployError::Apply {
                    dir: self.deploy.dir.clone(),
                    source,
                })?;
        }

        self.track_build_artifacts(builds);
        tracing::info!(
            dir = %self.deploy.dir.display(),
            namespaces = ?namespaces,
            "Deploy complete"
        );
        Ok(namespaces)
    }

    /// Delete what was deployed with `kpt live destroy`.
    ///
    /// Destroy also needs inventory identity, so the Kptfile is reconciled
    /// first.
    pub fn cleanup(&self, out: &mut dyn Write, cancel: &CancelToken) -> Result<(), DeployError> {
        self.reconcile(out, cancel)?;

        let _span = tracing::info_span!("live_destroy", dir = %self.deploy.dir.display()).entered();
        self.kpt
            .live_destroy(&self.deploy.dir, &self.deploy.flags, out, cancel)
            .map_err(|source| DeployError::Destroy {
                dir: self.deploy.dir.clone(),
                source,
            })
    }

    /// Register build artifacts so their pods can be selected later.
    pub fn track_build_artifacts(&mut self, artifacts: &[Artifact]) {
        self.pod_selector.add_artifacts(artifacts);
    }

    fn read_manifests(&self, cancel: &CancelToken) -> Result<ManifestList, DeployError> {
        let render_error = |reason: String| DeployError::Render {
            dir: self.deploy.dir.clone(),
            reason,
        };
        let bytes = self
            .kpt
            .fn_source(&self.deploy.dir, cancel)
            .map_err(|e| render_error(e.to_string()))?;
        ManifestList::from_resource_list(&bytes).map_err(|e| render_error(e.to_string()))
    }
}
