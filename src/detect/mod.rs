mod backend;
mod backends;
pub mod nms;
mod record;
mod registry;

pub use backend::DetectorBackend;
pub use backends::{ReplayBackend, StubBackend};
pub use registry::{BackendRegistry, SharedBackend};
pub use record::{BoundingBox, DetectionRecord};
