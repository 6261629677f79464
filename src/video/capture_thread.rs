use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use anyhow::Result;
use crossbeam_channel::{bounded, Receiver};
use crate::common::Frame;
use crate::video::FrameSource;

/// Reads frames on a dedicated thread, one frame ahead of the consumer.
///
/// The wrapped source is released on the capture thread once the stream ends or the
/// consumer releases this handle.
pub struct CaptureThread {
    rx: Option<Receiver<Result<Frame>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    pub fn spawn<S>(source: S) -> Result<Self>
    where
        S: FrameSource + Send + 'static,
    {
        let (tx, rx) = bounded::<Result<Frame>>(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        // Released when the closure is dropped, whether or not the thread ever started.
        let mut source = ReleaseOnDrop(source);
        let handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    match source.0.read_frame() {
                        Ok(Some(frame)) => {
                            if tx.send(Ok(frame)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            let _ = tx.send(Err(err));
                            break;
                        }
                    }
                }
                drop(source);
                log::debug!("Capture thread finished");
            })?;

        Ok(Self {
            rx: Some(rx),
            stop,
            handle: Some(handle),
        })
    }
}

struct ReleaseOnDrop<S: FrameSource>(S);

impl<S: FrameSource> Drop for ReleaseOnDrop<S> {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl FrameSource for CaptureThread {
    fn configure(&mut self, width: u32, height: u32) -> Result<()> {
        log::debug!("Capture thread already running, ignoring {width}x{height} request");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(rx) = &self.rx else {
            return Ok(None);
        };
        match rx.recv() {
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(err)) => Err(err),
            // sender gone: the source hit end of stream
            Err(_) => Ok(None),
        }
    }

    fn release(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // unblocks a pending send on the capture side
        self.rx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        left: u64,
        released: Arc<AtomicUsize>,
    }

    impl FrameSource for Counting {
        fn configure(&mut self, _: u32, _: u32) -> Result<()> {
            Ok(())
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            Ok(Some(Frame::new(RgbImage::new(2, 2), self.left)))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn frames_arrive_in_order_then_end() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut capture = CaptureThread::spawn(Counting { left: 3, released: released.clone() }).unwrap();

        let indices: Vec<u64> = std::iter::from_fn(|| capture.read_frame().unwrap())
            .map(|f| f.index)
            .collect();
        assert_eq!(indices, vec![2, 1, 0]);

        capture.release();
        capture.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn early_release_stops_the_thread() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut capture = CaptureThread::spawn(Counting { left: 1000, released: released.clone() }).unwrap();
        assert!(capture.read_frame().unwrap().is_some());
        drop(capture);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn source_is_released_if_the_thread_never_runs() {
        let released = Arc::new(AtomicUsize::new(0));
        let guard = ReleaseOnDrop(Counting { left: 1, released: released.clone() });
        let never_spawned = move || drop(guard);
        drop(never_spawned);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
