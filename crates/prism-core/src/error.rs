// SPDX-License-Identifier: CEPL-1.0
use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way bring-up or the frame loop can fail.
///
/// Variants are grouped by the stage that produces them; the message always
/// names that stage so the process exit report points at the culprit.
#[derive(Debug, Error)]
pub enum Error {
    // --- instance / surface ---
    #[error("instance creation failed: {0}")]
    InstanceCreationFailed(String),
    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(String),
    #[error("window handle unavailable: {0}")]
    WindowHandle(String),

    // --- adapter / queues / device ---
    #[error("no graphics adapter found")]
    NoAdapterFound,
    #[error("no adapter supports the required extensions, surface formats and present modes")]
    NoSuitableAdapter,
    #[error("selected adapter exposes no queue families")]
    NoQueueFamilies,
    #[error("selected adapter has no queue family for {missing}")]
    IncompleteQueueSupport { missing: &'static str },
    #[error("logical device creation failed: {0}")]
    DeviceCreationFailed(String),

    // --- presentation chain ---
    #[error("swapchain creation failed: {0}")]
    SwapchainCreationFailed(String),
    #[error("image view creation failed: {0}")]
    ImageViewCreationFailed(String),
    #[error("framebuffer creation failed: {0}")]
    FramebufferCreationFailed(String),

    // --- pipeline ---
    #[error("shader module `{name}` could not be created: {reason}")]
    ShaderModuleCreationFailed { name: String, reason: String },
    #[error("render pass creation failed: {0}")]
    RenderPassCreationFailed(String),
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),

    // --- commands / sync ---
    #[error("command pool creation failed: {0}")]
    CommandPoolCreationFailed(String),
    #[error("sync object creation failed: {0}")]
    SyncObjectCreationFailed(String),
    #[error("begin command buffer failed: {0}")]
    BeginRecordFailed(String),
    #[error("end command buffer failed: {0}")]
    EndRecordFailed(String),
    #[error("no framebuffer for swapchain image {0}")]
    InvalidImageIndex(u32),

    // --- frame loop ---
    #[error("waiting on the frame fence failed: {0}")]
    FenceWaitFailed(String),
    #[error("acquiring the next swapchain image failed: {0}")]
    AcquireFailed(String),
    #[error("queue submission rejected: {0}")]
    SubmitFailed(String),
    #[error("presentation failed: {0}")]
    PresentFailed(String),
    #[error("presentation chain is out of date and recreation is not supported")]
    SurfaceOutOfDate,

    // --- shader artifacts ---
    #[error("shader artifact `{name}` not found")]
    ArtifactNotFound { name: String },
    #[error("shader artifact `{name}` could not be read")]
    ArtifactReadFailed {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// True for the staleness signal a swapchain recreation path would
    /// recover from. Nothing recovers from it yet.
    pub fn needs_recreation(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_stage() {
        let err = Error::SwapchainCreationFailed("ERROR_INITIALIZATION_FAILED".into());
        assert_eq!(
            err.to_string(),
            "swapchain creation failed: ERROR_INITIALIZATION_FAILED"
        );

        let err = Error::IncompleteQueueSupport {
            missing: "presentation",
        };
        assert!(err.to_string().contains("presentation"));

        let err = Error::ShaderModuleCreationFailed {
            name: "triangle.vert.spv".into(),
            reason: "empty bytecode".into(),
        };
        assert!(err.to_string().contains("triangle.vert.spv"));
        assert!(err.to_string().contains("empty bytecode"));
    }

    #[test]
    fn only_out_of_date_needs_recreation() {
        assert!(Error::SurfaceOutOfDate.needs_recreation());
        assert!(!Error::SubmitFailed("x".into()).needs_recreation());
        assert!(!Error::NoSuitableAdapter.needs_recreation());
    }

    #[test]
    fn read_failures_keep_their_source() {
        use std::error::Error as _;
        let err = Error::ArtifactReadFailed {
            name: "triangle.frag.spv".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}
