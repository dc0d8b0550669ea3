//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use filetools_core::media::{MediaError, TranscodeEngine};
use filetools_core::InputFile;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// A PDF with `pages` US Letter pages, each showing its page number
pub fn pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {}", n))]),
                    Operation::new("ET", vec![]),
                ],
            };
            let stream = Stream::new(Dictionary::new(), content.encode().unwrap());
            let content_id = doc.add_object(stream);
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
            ]);
            Object::Reference(doc.add_object(page))
        })
        .collect();

    let tree = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(pages as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn pdf_file(name: &str, pages: u32) -> InputFile {
    InputFile::from_bytes(name, pdf(pages))
}

/// A solid-colour PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A JPEG with a gradient, so re-encoding has detail to work with
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Engine that records every command and answers `exec` by writing a
/// fixed payload to the output name (the last argument)
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    pub commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingEngine {
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TranscodeEngine for RecordingEngine {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), MediaError> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<(), MediaError> {
        self.commands.lock().unwrap().push(args.to_vec());
        let output = args
            .last()
            .ok_or_else(|| MediaError::ExecFailed("no output".into()))?;
        self.files
            .lock()
            .unwrap()
            .insert(output.clone(), b"transcoded".to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, MediaError> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| MediaError::Io(format!("missing {}", name)))
    }

    async fn remove_file(&self, name: &str) -> Result<(), MediaError> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }
}
