//! # Scheduler environment state
//!
//! This module defines [`crate::env_state::SchedulerEnv`], the **shared environment object**
//! handed to [`Target::new`](crate::target::Target::new). It bundles:
//!
//! - the explicit [`SchedulerConfig`] (defaults for target fields, tracker tuning),
//! - the collaborators a target relies on:
//!   name resolver, position parser, image data reader and phase correlator.
//!
//! ## Structure
//!
//! ```text
//! SchedulerEnv
//! ├── config       (SchedulerConfig)
//! ├── resolver     (Arc<dyn CoordinateResolver>)   default: SesameResolver
//! ├── parser       (Arc<dyn CoordinateParser>)     default: SexagesimalParser
//! ├── image_reader (Arc<dyn ImageDataReader>)      default: FitsImageReader
//! └── correlator   (Arc<dyn PhaseCorrelator>)      default: FftPhaseCorrelator
//! ```
//!
//! The object is cheap to clone; targets keep clones of the handles they need.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skyvisit::config::SchedulerConfig;
//! use skyvisit::env_state::SchedulerEnv;
//!
//! // Network resolution through CDS Sesame
//! let env = SchedulerEnv::new(SchedulerConfig::default())?;
//!
//! // Or no network at all: every target uses its explicit position
//! let offline = SchedulerEnv::offline(SchedulerConfig::default());
//! # Ok::<(), skyvisit::scheduler_errors::SchedulerError>(())
//! ```

use std::{fmt, sync::Arc};

use crate::{
    config::SchedulerConfig,
    coordinates::{
        sesame::SesameResolver, CoordinateParser, CoordinateResolver, OfflineResolver,
        SexagesimalParser,
    },
    scheduler_errors::SchedulerError,
    tracking::{
        image_io::{FitsImageReader, ImageDataReader},
        phase_correlation::{FftPhaseCorrelator, PhaseCorrelator},
    },
};

#[derive(Clone)]
pub struct SchedulerEnv {
    pub config: SchedulerConfig,
    resolver: Arc<dyn CoordinateResolver>,
    parser: Arc<dyn CoordinateParser>,
    image_reader: Arc<dyn ImageDataReader>,
    correlator: Arc<dyn PhaseCorrelator>,
}

impl fmt::Debug for SchedulerEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerEnv")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SchedulerEnv {
    /// Create an environment resolving names with CDS Sesame.
    ///
    /// Return
    /// ------
    /// * the environment, or an error if the resolver cannot be built (bad URL, runtime)
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let resolver = SesameResolver::new(&config.sesame_url, config.resolver_timeout())?;
        Ok(Self::offline(config).with_resolver(resolver))
    }

    /// Create an environment without name resolution.
    pub fn offline(config: SchedulerConfig) -> Self {
        let correlator = FftPhaseCorrelator::new(config.tracking.box_size);
        SchedulerEnv {
            config,
            resolver: Arc::new(OfflineResolver),
            parser: Arc::new(SexagesimalParser),
            image_reader: Arc::new(FitsImageReader),
            correlator: Arc::new(correlator),
        }
    }

    pub fn with_resolver(mut self, resolver: impl CoordinateResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_parser(mut self, parser: impl CoordinateParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_image_reader(mut self, reader: impl ImageDataReader + 'static) -> Self {
        self.image_reader = Arc::new(reader);
        self
    }

    pub fn with_correlator(mut self, correlator: impl PhaseCorrelator + 'static) -> Self {
        self.correlator = Arc::new(correlator);
        self
    }

    pub fn resolver(&self) -> &dyn CoordinateResolver {
        self.resolver.as_ref()
    }

    pub fn parser(&self) -> &dyn CoordinateParser {
        self.parser.as_ref()
    }

    pub(crate) fn image_reader(&self) -> Arc<dyn ImageDataReader> {
        Arc::clone(&self.image_reader)
    }

    pub(crate) fn correlator(&self) -> Arc<dyn PhaseCorrelator> {
        Arc::clone(&self.correlator)
    }
}
