//! Background image worker
//!
//! A dedicated thread that runs compress and resize jobs off the caller's
//! thread. Each request carries its own reply channel, so a reply always
//! reaches the request that produced it.

use super::{decode, encode, ImageError, CONVERT_QUALITY};
use crate::file::Blob;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use image::imageops::FilterType;
use image::ImageFormat;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerTask {
    /// Re-encode as JPEG at `quality` in `(0, 1]`
    Compress { data: Vec<u8>, quality: f32 },
    /// Resize to exactly `width` x `height`, encoded as PNG
    Resize {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
}

struct Job {
    task: WorkerTask,
    reply: Sender<Result<Blob, ImageError>>,
}

pub struct ImageWorker {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl ImageWorker {
    pub fn spawn() -> Self {
        let (sender, receiver) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("image-worker".into())
            .spawn(move || run(receiver))
            .map_err(|e| warn!("Failed to spawn image worker: {}", e))
            .ok();

        Self {
            sender: handle.as_ref().map(|_| sender),
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a task; the returned receiver yields exactly one reply
    pub fn submit(&self, task: WorkerTask) -> Result<Receiver<Result<Blob, ImageError>>, ImageError> {
        let sender = self.sender.as_ref().ok_or(ImageError::WorkerStopped)?;
        let (reply, receiver) = bounded(1);
        sender
            .send(Job { task, reply })
            .map_err(|_| ImageError::WorkerStopped)?;
        Ok(receiver)
    }

    /// Queue a task and wait for its reply
    pub fn run(&self, task: WorkerTask) -> Result<Blob, ImageError> {
        self.submit(task)?
            .recv()
            .map_err(|_| ImageError::WorkerStopped)?
    }

    /// Stop accepting work, let queued jobs finish and join the thread
    pub fn terminate(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Image worker panicked");
            }
        }
    }
}

impl Drop for ImageWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn run(receiver: Receiver<Job>) {
    debug!("Image worker started");
    for job in receiver {
        let result = process(job.task);
        // The requester may have stopped waiting
        let _ = job.reply.send(result);
    }
    debug!("Image worker stopped");
}

fn process(task: WorkerTask) -> Result<Blob, ImageError> {
    match task {
        WorkerTask::Compress { data, quality } => {
            let image = decode(&data)?.image;
            let bytes = encode(&image, ImageFormat::Jpeg, quality)?;
            Ok(Blob::new(bytes, ImageFormat::Jpeg.to_mime_type()))
        }
        WorkerTask::Resize {
            data,
            width,
            height,
        } => {
            if width == 0 || height == 0 {
                return Err(ImageError::InvalidDimensions { width, height });
            }
            let image = decode(&data)?
                .image
                .resize_exact(width, height, FilterType::Lanczos3);
            let bytes = encode(&image, ImageFormat::Png, CONVERT_QUALITY)?;
            Ok(Blob::new(bytes, ImageFormat::Png.to_mime_type()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::solid_image;
    use super::*;

    #[test]
    fn test_compress_replies_with_jpeg() {
        let worker = ImageWorker::spawn();
        let png = solid_image(16, 16, [0, 128, 255, 255], ImageFormat::Png);
        let blob = worker
            .run(WorkerTask::Compress {
                data: png,
                quality: 0.7,
            })
            .unwrap();
        assert_eq!(blob.mime, "image/jpeg");
    }

    #[test]
    fn test_replies_match_requests() {
        let worker = ImageWorker::spawn();
        let png = solid_image(8, 8, [1, 1, 1, 255], ImageFormat::Png);

        let pending: Vec<_> = (1..=5u32)
            .map(|size| {
                let reply = worker
                    .submit(WorkerTask::Resize {
                        data: png.clone(),
                        width: size,
                        height: size * 2,
                    })
                    .unwrap();
                (size, reply)
            })
            .collect();

        for (size, reply) in pending.into_iter().rev() {
            let blob = reply.recv().unwrap().unwrap();
            let image = decode(&blob.data).unwrap().image;
            assert_eq!((image.width(), image.height()), (size, size * 2));
        }
    }

    #[test]
    fn test_error_is_replied_not_dropped() {
        let worker = ImageWorker::spawn();
        let err = worker
            .run(WorkerTask::Compress {
                data: b"garbage".to_vec(),
                quality: 0.8,
            })
            .unwrap_err();
        assert_eq!(err, ImageError::Decode);
    }

    #[test]
    fn test_requests_after_terminate_fail() {
        let mut worker = ImageWorker::spawn();
        assert!(worker.is_running());
        worker.terminate();
        assert!(!worker.is_running());

        let png = solid_image(2, 2, [0, 0, 0, 255], ImageFormat::Png);
        assert!(matches!(
            worker.submit(WorkerTask::Compress {
                data: png,
                quality: 0.5
            }),
            Err(ImageError::WorkerStopped)
        ));
    }
}
