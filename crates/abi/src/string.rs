//! The host's string member layout.

use std::fmt;
use std::ptr::NonNull;

/// Owned NUL-terminated text laid out like the host's string member:
/// data pointer, `u16` length and `u16` buffer size.
///
/// An empty string has no buffer. The buffer is allocated by the extension and
/// only ever freed by it.
#[repr(C)]
pub struct HostString {
	data: Option<NonNull<u8>>,
	len: u16,
	cap: u16,
}

// SAFETY: the buffer is uniquely owned, like a `Box<[u8]>`.
unsafe impl Send for HostString {}
unsafe impl Sync for HostString {}

impl HostString {
	/// Longest text that fits, in bytes.
	pub const MAX_LEN: usize = u16::MAX as usize - 1;

	pub const fn empty() -> Self {
		Self {
			data: None,
			len: 0,
			cap: 0,
		}
	}

	/// Copies `text`, truncated to [`HostString::MAX_LEN`] bytes on a char boundary.
	pub fn new(text: &str) -> Self {
		let mut end = text.len().min(Self::MAX_LEN);
		while !text.is_char_boundary(end) {
			end -= 1;
		}
		if end < text.len() {
			tracing::warn!(len = text.len(), max = Self::MAX_LEN, "host string truncated");
		}
		if end == 0 {
			return Self::empty();
		}
		let mut buf = Vec::with_capacity(end + 1);
		buf.extend_from_slice(&text.as_bytes()[..end]);
		buf.push(0);
		let buf: Box<[u8]> = buf.into_boxed_slice();
		let cap = buf.len() as u16;
		Self {
			data: Some(NonNull::from(Box::leak(buf)).cast::<u8>()),
			len: end as u16,
			cap,
		}
	}

	pub fn as_str(&self) -> &str {
		match self.data {
			// SAFETY: the buffer holds `len` bytes copied from a `&str`.
			Some(data) => unsafe {
				std::str::from_utf8_unchecked(std::slice::from_raw_parts(data.as_ptr(), self.len as usize))
			},
			None => "",
		}
	}

	pub fn len(&self) -> usize {
		self.len as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

impl Drop for HostString {
	fn drop(&mut self) {
		if let Some(data) = self.data.take() {
			let buf = std::ptr::slice_from_raw_parts_mut(data.as_ptr(), self.cap as usize);
			// SAFETY: allocated in `new` as a boxed slice of `cap` bytes.
			drop(unsafe { Box::from_raw(buf) });
		}
	}
}

impl Default for HostString {
	fn default() -> Self {
		Self::empty()
	}
}

impl Clone for HostString {
	fn clone(&self) -> Self {
		Self::new(self.as_str())
	}
}

impl PartialEq for HostString {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for HostString {}

impl PartialEq<str> for HostString {
	fn eq(&self, other: &str) -> bool {
		self.as_str() == other
	}
}

impl PartialEq<&str> for HostString {
	fn eq(&self, other: &&str) -> bool {
		self.as_str() == *other
	}
}

impl From<&str> for HostString {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}

impl fmt::Debug for HostString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self.as_str(), f)
	}
}

impl fmt::Display for HostString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
