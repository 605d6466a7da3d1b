pub mod device;
pub mod ioctl;

pub use device::IonDevice;
