use super::{AllocData, MemAlloc};
use crate::error::GrallocResult;
use crate::heap::{CachePolicy, HeapMask};
use crate::ion::IonDevice;
use crate::ion::ioctl::{AllocationData, ION_FLAG_CACHED, ION_SECURE, IonUserHandle};
use std::io;
use std::os::fd::RawFd;
use std::ptr;

/// [`MemAlloc`] backed by the ION driver.
///
/// Buffers are exported as dma-buf fds and, unless secure, mapped into this
/// process. The ION handle itself is dropped right after export; the fd keeps
/// the buffer alive.
#[derive(Debug, Clone)]
pub struct IonAlloc {
    device: IonDevice,
}

impl IonAlloc {
    #[must_use]
    pub const fn new(device: IonDevice) -> Self {
        Self { device }
    }

    /// Opens `/dev/ion`.
    ///
    /// # Errors
    /// Returns an error if the device cannot be opened.
    pub fn open() -> io::Result<Self> {
        Ok(Self::new(IonDevice::open()?))
    }

    #[must_use]
    pub const fn device(&self) -> &IonDevice {
        &self.device
    }

    /// Drops this client's reference to `handle`. A failure leaks the handle
    /// until the device is closed, so it is logged and reported.
    fn release_handle(&self, handle: IonUserHandle) -> bool {
        match self.device.free(handle) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("ION_IOC_FREE of handle {handle} failed: {e}");
                false
            }
        }
    }
}

impl MemAlloc for IonAlloc {
    fn alloc_buffer(&self, data: &mut AllocData) -> GrallocResult<()> {
        let secure = data.heap_mask.contains(HeapMask::SECURE);

        let mut flags = match data.cache_policy {
            CachePolicy::Cached => ION_FLAG_CACHED,
            CachePolicy::Uncached => 0,
        };
        if secure {
            flags |= ION_SECURE;
        }

        let mut args = AllocationData {
            len: data.size,
            align: data.align,
            heap_id_mask: data.heap_mask.heaps().bits(),
            flags,
            handle: 0,
        };

        if let Err(e) = self.device.alloc(&mut args) {
            log::error!(
                "ION_IOC_ALLOC failed: size {} heaps 0x{:x}: {e}",
                data.size,
                args.heap_id_mask
            );
            return Err(e.into());
        }

        let fd = match self.device.map(args.handle) {
            Ok(fd) => fd,
            Err(e) => {
                log::error!("ION_IOC_MAP failed: {e}");
                self.release_handle(args.handle);
                return Err(e.into());
            }
        };

        let mut base = 0;
        if !secure {
            let ret = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    args.len,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_SHARED,
                    fd,
                    0,
                )
            };

            if ret == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                log::error!("mmap of ion fd {fd} failed: {err}");
                unsafe {
                    libc::close(fd);
                }
                self.release_handle(args.handle);
                return Err(err.into());
            }

            // Fresh buffers must not leak a previous owner's contents.
            unsafe {
                ptr::write_bytes(ret.cast::<u8>(), 0, args.len);
            }
            base = ret as usize;
        }

        // The exported fd holds its own reference.
        self.release_handle(args.handle);

        data.fd = fd;
        data.base = base;
        data.offset = 0;
        data.size = args.len;

        log::debug!("ion: allocated fd {fd} base 0x{base:x} size {}", data.size);
        Ok(())
    }

    fn free_buffer(&self, base: usize, size: usize, offset: usize, fd: RawFd) -> GrallocResult<()> {
        let mut result = Ok(());

        if base != 0 {
            let ret = unsafe { libc::munmap((base - offset) as *mut libc::c_void, size) };
            if ret < 0 {
                let err = io::Error::last_os_error();
                log::error!("munmap of 0x{base:x} failed: {err}");
                result = Err(err.into());
            }
        }

        if unsafe { libc::close(fd) } < 0 {
            let err = io::Error::last_os_error();
            log::error!("close of ion fd {fd} failed: {err}");
            result = Err(err.into());
        }

        result
    }
}
