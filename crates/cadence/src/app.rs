#![forbid(unsafe_code)]

//! The [`Cadence`] host object.
//!
//! Owns one performance context, one set of motion preferences, one
//! orchestrator and the frame driver, and wires them to the host's
//! settings store, accessibility service and render loop.
//!
//! # Failure Modes
//!
//! Platform primitives that are unavailable are logged and absorbed: the
//! frame monitor stays inert, reduce motion stays off, and the rest of the
//! API keeps working.

use std::time::{Duration, Instant};

use cadence_budget::{
    DeviceClass, GovernorConfig, GovernorTelemetry, LevelSelection, LevelTransition,
    PerformanceConfig, PerformanceContext, PerformanceGovernor, PerformanceLevel,
};
use cadence_core::accessibility::{AccessibilityOptions, MotionPreferences};
use cadence_core::animation::{Motion, OnFinish};
use cadence_core::host::{
    AccessibilityService, RenderLoop, SettingsStore, Subscription, UserSettings,
};
use cadence_fx::{ParticleConfig, ParticleSystem, ParticleSystemRequest, ParticleTrigger};
use cadence_runtime::{
    AnimationHandle, AnimationOrchestrator, CompositionMode, FrameDriver, FrameReport,
};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::Result;

/// Construction options for [`Cadence`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceBuilder {
    device: DeviceClass,
    governor: GovernorConfig,
    particles: ParticleConfig,
    manual_level: Option<PerformanceLevel>,
}

impl Default for CadenceBuilder {
    fn default() -> Self {
        Self {
            device: DeviceClass::detect(),
            governor: GovernorConfig::default(),
            particles: ParticleConfig::default(),
            manual_level: None,
        }
    }
}

impl CadenceBuilder {
    /// Defaults with every environment override applied.
    pub fn from_env() -> Self {
        Self {
            governor: GovernorConfig::from_env(),
            particles: ParticleConfig::from_env(),
            ..Self::default()
        }
    }

    /// Override the detected device class (builder).
    #[must_use]
    pub fn device(mut self, device: DeviceClass) -> Self {
        self.device = device;
        self
    }

    /// Governor tuning (builder).
    #[must_use]
    pub fn governor(mut self, config: GovernorConfig) -> Self {
        self.governor = config;
        self
    }

    /// Particle tuning (builder).
    #[must_use]
    pub fn particles(mut self, config: ParticleConfig) -> Self {
        self.particles = config;
        self
    }

    /// Start pinned to `level` (builder).
    #[must_use]
    pub fn manual_level(mut self, level: PerformanceLevel) -> Self {
        self.manual_level = Some(level);
        self
    }

    pub fn build(self) -> Cadence {
        let perf = PerformanceContext::new(PerformanceGovernor::for_device(
            self.governor,
            self.device,
            self.manual_level,
        ));
        let prefs = MotionPreferences::new();
        let orchestrator = AnimationOrchestrator::new(perf.clone(), prefs.clone());
        Cadence {
            driver: FrameDriver::new(orchestrator.clone()),
            perf,
            prefs,
            orchestrator,
            particles: self.particles,
            subscriptions: Vec::new(),
        }
    }
}

/// Adaptive animation host.
#[derive(Debug)]
pub struct Cadence {
    perf: PerformanceContext,
    prefs: MotionPreferences,
    orchestrator: AnimationOrchestrator,
    driver: FrameDriver,
    particles: ParticleConfig,
    subscriptions: Vec<Subscription>,
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new()
    }
}

impl Cadence {
    /// Detected device class, environment overrides applied.
    pub fn new() -> Self {
        CadenceBuilder::from_env().build()
    }

    pub fn builder() -> CadenceBuilder {
        CadenceBuilder::default()
    }

    // --- Particles --------------------------------------------------------

    /// A fresh, idle particle system on this host's orchestrator.
    pub fn particle_system(&self) -> ParticleSystem {
        ParticleSystem::new(self.orchestrator.clone(), self.particles)
    }

    /// Emit one burst from `system`.
    pub fn trigger_particles(
        &self,
        system: &ParticleSystem,
        request: &ParticleSystemRequest,
        on_complete: OnFinish,
    ) -> Result<ParticleTrigger> {
        Ok(system.trigger(request, on_complete)?)
    }

    // --- Animations -------------------------------------------------------

    /// Register a composite animation; call `start()` on the handle.
    pub fn run_animation(&self, members: Vec<Motion>, mode: CompositionMode) -> AnimationHandle {
        self.orchestrator.run_animation(members, mode)
    }

    /// An interaction began; batched starts wait for it.
    pub fn begin_interaction(&self) {
        self.orchestrator.begin_interaction();
    }

    /// An interaction ended.
    pub fn end_interaction(&self) {
        self.orchestrator.end_interaction();
    }

    // --- Performance ------------------------------------------------------

    /// Policy record for the effective level.
    pub fn current_config(&self) -> PerformanceConfig {
        self.perf.config()
    }

    pub fn level(&self) -> PerformanceLevel {
        self.perf.level()
    }

    /// Pin a level or return to automatic selection.
    pub fn set_performance_level(&self, selection: LevelSelection) -> Option<LevelTransition> {
        self.perf.set_performance_level(selection)
    }

    /// [`set_performance_level`](Self::set_performance_level) from a name:
    /// `auto` or one of `high|medium|low|critical`.
    pub fn set_performance_level_named(&self, name: &str) -> Result<Option<LevelTransition>> {
        let selection = name.parse::<LevelSelection>()?;
        Ok(self.set_performance_level(selection))
    }

    pub fn telemetry(&self) -> GovernorTelemetry {
        self.perf.telemetry()
    }

    /// Take queued level transitions, oldest first.
    pub fn drain_transitions(&self) -> Vec<LevelTransition> {
        self.perf.drain_transitions()
    }

    pub fn accessibility(&self) -> AccessibilityOptions {
        self.prefs.options()
    }

    pub fn performance(&self) -> &PerformanceContext {
        &self.perf
    }

    pub fn preferences(&self) -> &MotionPreferences {
        &self.prefs
    }

    pub fn orchestrator(&self) -> &AnimationOrchestrator {
        &self.orchestrator
    }

    // --- Frame loop -------------------------------------------------------

    /// Handle one render-loop tick.
    pub fn on_frame(&mut self, now: Instant) -> FrameReport {
        self.driver.on_frame(now)
    }

    /// Advance animations by `dt` without sampling frame pacing.
    pub fn tick(&mut self, dt: Duration) -> usize {
        self.driver.tick(dt)
    }

    /// Startup interactions are over: the frame monitor starts sampling.
    ///
    /// Interactions opened with [`begin_interaction`](Self::begin_interaction)
    /// stay pending until their matching
    /// [`end_interaction`](Self::end_interaction).
    pub fn interactions_settled(&self) {
        self.perf.interactions_settled();
    }

    // --- Host bindings ----------------------------------------------------

    /// Register the frame monitor with `render`. An unsupported loop leaves
    /// the level where it is.
    pub fn start_monitoring(&self, render: &dyn RenderLoop) {
        if let Err(_err) = self.perf.start_monitoring(render) {
            #[cfg(feature = "tracing")]
            warn!(error = %_err, "frame monitoring unavailable");
        }
    }

    /// Apply the store's settings now and follow its changes.
    pub fn bind_settings(&mut self, store: &dyn SettingsStore) {
        apply_settings(&self.perf, &self.prefs, &store.settings());
        let perf = self.perf.clone();
        let prefs = self.prefs.clone();
        let subscription = store.subscribe(Box::new(move |settings: &UserSettings| {
            apply_settings(&perf, &prefs, settings);
        }));
        self.subscriptions.push(subscription);
    }

    /// Query the platform reduce-motion flag and follow its changes.
    pub fn bind_accessibility(&mut self, service: &dyn AccessibilityService) {
        if let Some(subscription) = self.prefs.bind_platform(service) {
            self.subscriptions.push(subscription);
        }
    }

    /// Stop every animation and the frame monitor, and drop every host
    /// subscription. The instance stays usable.
    pub fn shutdown(&mut self) {
        self.orchestrator.stop_all();
        self.perf.stop_monitoring();
        self.subscriptions.clear();
        self.driver.reset();
        #[cfg(feature = "tracing")]
        debug!("cadence shut down");
    }
}

fn apply_settings(perf: &PerformanceContext, prefs: &MotionPreferences, settings: &UserSettings) {
    prefs.apply_settings(settings);
    if let Some(_transition) = perf.apply_settings(settings) {
        #[cfg(feature = "tracing")]
        debug!(
            from = _transition.from.as_str(),
            to = _transition.to.as_str(),
            "settings changed the performance level"
        );
    }
}
