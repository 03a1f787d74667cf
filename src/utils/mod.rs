//! Utility functions for the detection pipeline.
//!
//! This module provides image loading helpers, optional visualization and
//! logging setup.

pub mod image;
#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export image loading functions
pub use self::image::{dynamic_to_rgb, load_image, load_images_batch_with_policy};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
