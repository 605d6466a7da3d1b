#![allow(clippy::used_underscore_items, clippy::cast_possible_truncation)]

const _IOC_NRBITS: u32 = 8;
const _IOC_TYPEBITS: u32 = 8;
const _IOC_SIZEBITS: u32 = 14;

const _IOC_NRSHIFT: u32 = 0;
const _IOC_TYPESHIFT: u32 = _IOC_NRSHIFT + _IOC_NRBITS;
const _IOC_SIZESHIFT: u32 = _IOC_TYPESHIFT + _IOC_TYPEBITS;
const _IOC_DIRSHIFT: u32 = _IOC_SIZESHIFT + _IOC_SIZEBITS;

const _IOC_WRITE: u32 = 1;
const _IOC_READ: u32 = 2;

#[must_use]
pub const fn _ioc(dir: u32, type_: u32, nr: u32, size: usize) -> u32 {
    (dir << _IOC_DIRSHIFT)
        | (type_ << _IOC_TYPESHIFT)
        | (nr << _IOC_NRSHIFT)
        | ((size as u32) << _IOC_SIZESHIFT)
}

#[must_use]
pub const fn iowr<T>(type_: u32, nr: u32) -> u32 {
    _ioc(_IOC_READ | _IOC_WRITE, type_, nr, std::mem::size_of::<T>())
}

/// Rounds `val` up to the next multiple of `align`, `None` on overflow.
///
/// `align` does not need to be a power of two; chroma strides and
/// codec boundaries are all powers of two, but the vendor padding routine
/// is not required to return one.
#[must_use]
pub const fn align_up(val: usize, align: usize) -> Option<usize> {
    if align == 0 {
        return Some(val);
    }
    val.checked_next_multiple_of(align)
}

/// Returns the system page size, falling back to 4 KiB if `sysconf` fails.
#[must_use]
pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as usize } else { 4096 }
}
