use crate::ion::ioctl::{
    AllocationData, FdData, HandleData, ION_IOC_ALLOC, ION_IOC_FREE, ION_IOC_MAP, IonUserHandle,
};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::RawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

pub const ION_DEVICE_PATH: &str = "/dev/ion";

/// A handle to the ION memory manager character device (`/dev/ion`).
///
/// The file is held in an `Arc`, so the device is cheap to clone and share
/// between allocators.
#[derive(Clone, Debug)]
pub struct IonDevice {
    pub file: Arc<File>,
}

impl IonDevice {
    /// Opens the ION device.
    ///
    /// # Errors
    /// Returns an error if `/dev/ion` cannot be opened (no ION driver, permissions).
    pub fn open() -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_DSYNC)
            .open(ION_DEVICE_PATH)?;

        Ok(Self {
            file: Arc::new(file),
        })
    }

    /// Generic unsafe helper to execute an IOCTL.
    ///
    /// # Safety
    /// The caller must ensure that `arg` points to valid memory appropriate for the specific `cmd`.
    unsafe fn ioctl<T>(&self, cmd: u32, arg: &mut T) -> io::Result<()> {
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), cmd as _, arg as *mut T) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Allocate a buffer. On success `args.handle` holds the new ION handle.
    pub fn alloc(&self, args: &mut AllocationData) -> io::Result<()> {
        unsafe { self.ioctl(ION_IOC_ALLOC, args) }
    }

    /// Drop this client's reference to a buffer.
    pub fn free(&self, handle: IonUserHandle) -> io::Result<()> {
        let mut args = HandleData { handle };
        unsafe { self.ioctl(ION_IOC_FREE, &mut args) }
    }

    /// Get a mappable file descriptor for a buffer.
    pub fn map(&self, handle: IonUserHandle) -> io::Result<RawFd> {
        let mut args = FdData { handle, fd: -1 };
        unsafe {
            self.ioctl(ION_IOC_MAP, &mut args)?;
        }
        Ok(args.fd)
    }
}

impl AsRawFd for IonDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
