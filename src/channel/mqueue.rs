use std::ffi::CString;
use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;
use std::os::unix::io::RawFd;

use tracing::warn;

use crate::ChannelError;

/// Safe handle over a POSIX message queue descriptor.
///
/// Created by the collector with [`MessageQueue::create`]; any other process
/// (or task) attaches with [`MessageQueue::open`], which reads the capacity
/// negotiated at creation back from the kernel instead of re-specifying it.
/// The descriptor is opened nonblocking so the collector can wait on
/// readiness notifications rather than spinning, and so senders get a
/// [`ChannelError::WouldBlock`] they can retry instead of stalling a runtime
/// thread.
///
/// Delivery is priority-ordered: highest priority first, FIFO within one
/// priority. That ordering is the only synchronization between the many
/// producers and the one consumer.
#[derive(Debug)]
pub struct MessageQueue {
    name: String,
    mqd: libc::mqd_t,
    max_depth: i64,
    max_message_size: i64,
}

// mqd_t is a plain descriptor; the kernel serializes concurrent operations.
unsafe impl Send for MessageQueue {}
unsafe impl Sync for MessageQueue {}

impl MessageQueue {
    /// Create a new queue under `name` (must start with `/`).
    ///
    /// Opened with `O_EXCL`: a name collision from a stale, uncleaned prior
    /// session is a fatal setup error, never adopted.
    pub fn create(
        name: &str,
        max_message_size: i64,
        max_depth: i64,
    ) -> std::result::Result<Self, ChannelError> {
        let c_name = c_queue_name(name)?;
        let mut attr: libc::mq_attr = unsafe { mem::zeroed() };
        attr.mq_maxmsg = max_depth as _;
        attr.mq_msgsize = max_message_size as _;

        let mqd = unsafe {
            libc::mq_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR | libc::O_NONBLOCK,
                0o644 as libc::c_uint,
                &mut attr as *mut libc::mq_attr,
            )
        };
        if mqd < 0 {
            return Err(map_open_errno(name, io::Error::last_os_error()));
        }
        Ok(MessageQueue {
            name: name.to_string(),
            mqd,
            max_depth,
            max_message_size,
        })
    }

    /// Attach to an existing queue by name.
    ///
    /// Capacity values are read back from the kernel with `mq_getattr`;
    /// creation-time capacity is immutable for the life of the name.
    pub fn open(name: &str) -> std::result::Result<Self, ChannelError> {
        let c_name = c_queue_name(name)?;
        let mqd = unsafe { libc::mq_open(c_name.as_ptr(), libc::O_RDWR | libc::O_NONBLOCK) };
        if mqd < 0 {
            return Err(map_open_errno(name, io::Error::last_os_error()));
        }

        let mut attr: libc::mq_attr = unsafe { mem::zeroed() };
        if unsafe { libc::mq_getattr(mqd, &mut attr) } < 0 {
            let e = io::Error::last_os_error();
            unsafe { libc::mq_close(mqd) };
            return Err(ChannelError::Io(e));
        }
        Ok(MessageQueue {
            name: name.to_string(),
            mqd,
            max_depth: attr.mq_maxmsg as i64,
            max_message_size: attr.mq_msgsize as i64,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum queued, unread messages (negotiated at creation)
    pub fn max_depth(&self) -> i64 {
        self.max_depth
    }

    /// Maximum payload size in bytes (negotiated at creation)
    pub fn max_message_size(&self) -> i64 {
        self.max_message_size
    }

    /// Enqueue one payload at `priority`.
    ///
    /// Returns [`ChannelError::WouldBlock`] when the queue is at depth; the
    /// caller decides between retrying (backpressure) and logging the loss.
    /// A failed send must never abort the compilation it instruments.
    pub fn send(
        &self,
        payload: &[u8],
        priority: u32,
    ) -> std::result::Result<(), ChannelError> {
        if payload.len() > self.max_message_size as usize {
            return Err(ChannelError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_message_size as usize,
            });
        }
        let res = unsafe {
            libc::mq_send(
                self.mqd,
                payload.as_ptr() as *const libc::c_char,
                payload.len(),
                priority,
            )
        };
        if res < 0 {
            return Err(map_io_errno(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Dequeue the highest-priority message, nonblocking.
    ///
    /// Returns [`ChannelError::WouldBlock`] when the queue is empty; the
    /// collector only calls this after a readiness notification.
    pub fn recv(&self) -> std::result::Result<(Vec<u8>, u32), ChannelError> {
        let mut buf = vec![0u8; self.max_message_size as usize];
        let mut priority: libc::c_uint = 0;
        let received = unsafe {
            libc::mq_receive(
                self.mqd,
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut priority,
            )
        };
        if received < 0 {
            return Err(map_io_errno(io::Error::last_os_error()));
        }
        buf.truncate(received as usize);
        Ok((buf, priority))
    }

    /// Remove the queue name system-wide. Only the collector unlinks, and
    /// only after confirming the terminal event (or on a failure path).
    /// Handles still open keep working until closed; new opens fail.
    pub fn unlink(name: &str) -> std::result::Result<(), ChannelError> {
        let c_name = c_queue_name(name)?;
        if unsafe { libc::mq_unlink(c_name.as_ptr()) } < 0 {
            return Err(map_open_errno(name, io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Release this process's view of the queue
    pub fn close(self) {
        // Drop performs the mq_close
    }
}

impl AsRawFd for MessageQueue {
    /// On Linux a message-queue descriptor is a file descriptor, which is
    /// what lets the collector wait on readability through the runtime
    /// instead of polling in a loop.
    fn as_raw_fd(&self) -> RawFd {
        self.mqd as RawFd
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        if unsafe { libc::mq_close(self.mqd) } < 0 {
            warn!(
                "closing message queue '{}' failed: {}",
                self.name,
                io::Error::last_os_error()
            );
        }
    }
}

fn c_queue_name(name: &str) -> std::result::Result<CString, ChannelError> {
    CString::new(name).map_err(|_| {
        ChannelError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "queue name contains an interior NUL byte",
        ))
    })
}

/// errno taxonomy for open/create/unlink
fn map_open_errno(
    name: &str,
    err: io::Error,
) -> ChannelError {
    match err.raw_os_error() {
        Some(libc::EEXIST) => ChannelError::AlreadyExists(name.to_string()),
        Some(libc::ENOENT) => ChannelError::NotFound(name.to_string()),
        Some(libc::EACCES) => ChannelError::PermissionDenied(name.to_string()),
        Some(libc::ENOSPC) | Some(libc::EMFILE) | Some(libc::ENFILE) => {
            ChannelError::ResourceLimit(name.to_string())
        }
        _ => ChannelError::Io(err),
    }
}

/// errno taxonomy for send/recv on an open descriptor
fn map_io_errno(err: io::Error) -> ChannelError {
    match err.raw_os_error() {
        Some(libc::EAGAIN) => ChannelError::WouldBlock,
        Some(libc::EBADF) => ChannelError::Closed,
        _ => ChannelError::Io(err),
    }
}
