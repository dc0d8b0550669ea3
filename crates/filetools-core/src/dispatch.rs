//! Tool dispatch
//!
//! Maps a tool name and the first input file to exactly one [`Tool`],
//! validates the request, reads options with their defaults and runs the
//! adapter. CPU-bound adapters run on the blocking pool; audio and video
//! tools go through the shared [`MediaRuntime`].

use crate::archive;
use crate::catalog::OptionSpec;
use crate::document::{self, CodeLanguage};
use crate::error::ToolError;
use crate::file::{Blob, FileCategory, InputFile};
use crate::image;
use crate::media::{self, EngineConfig, MediaRuntime, TranscodeJob, AUDIO_FORMATS, VIDEO_FORMATS};
use crate::options::{OptionError, ToolOptions};
use crate::pdf::{self, NumberPosition, WatermarkStyle, PDF_MIME};
use crate::progress::{report, ProgressSink};
use crate::validation::{
    validate_file_count, validate_request, SizeLimits, ValidationError, DEFAULT_MAX_FILES,
};
use tracing::{debug, warn};

/// Tools that take every input file rather than only the first
pub const MULTI_FILE_TOOLS: &[&str] = &["Merge PDFs", "Merge Audio", "Merge Videos", "Create ZIP"];

const IMAGE_FORMATS: &[&str] = &["png", "jpeg", "webp", "gif", "bmp", "tiff"];

/// Option values used when a request leaves an option out
mod defaults {
    pub const QUALITY: f32 = 0.8;
    pub const RESIZE_WIDTH: u32 = 800;
    pub const RESIZE_HEIGHT: u32 = 600;
    pub const IMAGE_FORMAT: &str = "png";
    pub const DEGREES: i64 = 90;
    pub const CROP_SIZE: u32 = 500;
    pub const BRIGHTNESS: i64 = 20;
    pub const FILTER: &str = "grayscale(100%)";
    pub const BLUR: f64 = 5.0;
    pub const WATERMARK_TEXT: &str = "Watermark";
    pub const PAGE_ORDER: &[usize] = &[0, 1, 2];
    pub const FIRST_PAGE: &[usize] = &[0];
    pub const START_FROM: i64 = 1;
    pub const AUDIO_FORMAT: &str = "mp3";
    pub const VIDEO_FORMAT: &str = "mp4";
    pub const TRIM_DURATION: f64 = 10.0;
    pub const SPEED: f64 = 1.5;
    pub const VOLUME: f64 = 1.5;
    pub const FADE: f64 = 2.0;
    pub const VIDEO_CROP_WIDTH: u32 = 640;
    pub const VIDEO_CROP_HEIGHT: u32 = 480;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTool {
    Compress,
    Resize,
    Convert,
    Rotate,
    Flip,
    Crop,
    Brightness,
    Filters,
    Blur,
    Sharpen,
    Watermark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfTool {
    Merge,
    Split,
    Rotate,
    RemovePages,
    ExtractPages,
    Organize,
    Compress,
    Watermark,
    PageNumbers,
    Repair,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTool {
    Convert,
    Compress,
    Trim,
    Merge,
    Volume,
    Speed,
    Fade,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoTool {
    Convert,
    Compress,
    Trim,
    ExtractAudio,
    ToGif,
    Rotate,
    Merge,
    RemoveAudio,
    Crop,
    Speed,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTool {
    FormatJson,
    MinifyJson,
    ValidateJson,
    JsonToCsv,
    CsvToJson,
    FormatXml,
    ValidateXml,
    FormatCode(CodeLanguage),
    MinifyCode(CodeLanguage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveTool {
    Create,
    Extract,
    List,
}

/// A resolved tool: one variant per category and tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Image(ImageTool),
    Pdf(PdfTool),
    Audio(AudioTool),
    Video(VideoTool),
    Document(DocumentTool),
    Archive(ArchiveTool),
}

impl Tool {
    /// Resolve a tool name against the first input file.
    ///
    /// Names shared between categories ("Compress", "Convert Format",
    /// "Change Speed", "Format Code", ...) pick the variant for the file's
    /// category or extension.
    pub fn resolve(name: &str, file: &InputFile) -> Result<Tool, ToolError> {
        use FileCategory as C;

        let category = file.category();
        let extension = file.extension();
        let not_implemented = || ToolError::NotImplemented(name.to_string());

        let tool = match (name, category) {
            ("Create ZIP", _) => Tool::Archive(ArchiveTool::Create),
            ("Extract", _) => Tool::Archive(ArchiveTool::Extract),
            ("View Contents", _) => Tool::Archive(ArchiveTool::List),
            ("Extract Audio from Video", _) => Tool::Video(VideoTool::ExtractAudio),

            ("Compress", C::Image) => Tool::Image(ImageTool::Compress),
            ("Resize", C::Image) => Tool::Image(ImageTool::Resize),
            ("Convert Format", C::Image) => Tool::Image(ImageTool::Convert),
            ("Rotate", C::Image) => Tool::Image(ImageTool::Rotate),
            ("Rotate & Flip", C::Image) => Tool::Image(ImageTool::Flip),
            ("Crop", C::Image) => Tool::Image(ImageTool::Crop),
            ("Adjust Brightness", C::Image) => Tool::Image(ImageTool::Brightness),
            ("Apply Filters", C::Image) => Tool::Image(ImageTool::Filters),
            ("Blur Image", C::Image) => Tool::Image(ImageTool::Blur),
            ("Sharpen Image", C::Image) => Tool::Image(ImageTool::Sharpen),
            ("Add Watermark", C::Image) => Tool::Image(ImageTool::Watermark),

            ("Merge PDFs", C::Pdf) => Tool::Pdf(PdfTool::Merge),
            ("Split PDF", C::Pdf) => Tool::Pdf(PdfTool::Split),
            ("Rotate Pages", C::Pdf) => Tool::Pdf(PdfTool::Rotate),
            ("Remove Pages", C::Pdf) => Tool::Pdf(PdfTool::RemovePages),
            ("Extract Pages", C::Pdf) => Tool::Pdf(PdfTool::ExtractPages),
            ("Organize Pages", C::Pdf) => Tool::Pdf(PdfTool::Organize),
            ("Compress PDF", C::Pdf) => Tool::Pdf(PdfTool::Compress),
            ("Add Watermark", C::Pdf) => Tool::Pdf(PdfTool::Watermark),
            ("Add Page Numbers", C::Pdf) => Tool::Pdf(PdfTool::PageNumbers),
            ("Repair PDF", C::Pdf) => Tool::Pdf(PdfTool::Repair),
            ("PDF Info", C::Pdf) => Tool::Pdf(PdfTool::Info),

            ("Convert Format", C::Audio) => Tool::Audio(AudioTool::Convert),
            ("Compress" | "Compress Audio", C::Audio) => Tool::Audio(AudioTool::Compress),
            ("Trim Audio", C::Audio) => Tool::Audio(AudioTool::Trim),
            ("Merge Audio", C::Audio) => Tool::Audio(AudioTool::Merge),
            ("Change Volume", C::Audio) => Tool::Audio(AudioTool::Volume),
            ("Change Speed", C::Audio) => Tool::Audio(AudioTool::Speed),
            ("Add Fade", C::Audio) => Tool::Audio(AudioTool::Fade),
            ("Reverse Audio", C::Audio) => Tool::Audio(AudioTool::Reverse),

            ("Convert Format", C::Video) => Tool::Video(VideoTool::Convert),
            ("Compress" | "Compress Video", C::Video) => Tool::Video(VideoTool::Compress),
            ("Trim Video", C::Video) => Tool::Video(VideoTool::Trim),
            ("Extract Audio", C::Video) => Tool::Video(VideoTool::ExtractAudio),
            ("Video to GIF", C::Video) => Tool::Video(VideoTool::ToGif),
            ("Rotate Video", C::Video) => Tool::Video(VideoTool::Rotate),
            ("Merge Videos", C::Video) => Tool::Video(VideoTool::Merge),
            ("Remove Audio", C::Video) => Tool::Video(VideoTool::RemoveAudio),
            ("Crop Video", C::Video) => Tool::Video(VideoTool::Crop),
            ("Change Speed", C::Video) => Tool::Video(VideoTool::Speed),
            ("Reverse Video", C::Video) => Tool::Video(VideoTool::Reverse),

            ("Format JSON", C::Document) => Tool::Document(DocumentTool::FormatJson),
            ("Minify JSON", C::Document) => Tool::Document(DocumentTool::MinifyJson),
            ("Validate JSON", C::Document) => Tool::Document(DocumentTool::ValidateJson),
            ("Convert to CSV", C::Document) if file.mime == document::JSON_MIME => {
                Tool::Document(DocumentTool::JsonToCsv)
            }
            ("Convert to JSON", C::Document) if extension.as_deref() == Some("csv") => {
                Tool::Document(DocumentTool::CsvToJson)
            }
            ("Format XML", C::Document) => Tool::Document(DocumentTool::FormatXml),
            ("Validate XML", C::Document) => Tool::Document(DocumentTool::ValidateXml),
            ("Format Code" | "Minify", C::Document) => {
                let language = extension
                    .as_deref()
                    .and_then(CodeLanguage::from_extension)
                    .ok_or_else(not_implemented)?;
                if name == "Minify" {
                    Tool::Document(DocumentTool::MinifyCode(language))
                } else {
                    Tool::Document(DocumentTool::FormatCode(language))
                }
            }

            _ => return Err(not_implemented()),
        };
        Ok(tool)
    }

    /// Whether the tool runs through the transcoding engine
    pub fn uses_engine(self) -> bool {
        matches!(self, Tool::Audio(_) | Tool::Video(_))
    }

    /// Options the tool reads, with the values used when they are absent
    pub fn option_specs(self) -> Vec<OptionSpec> {
        use defaults::*;

        match self {
            Tool::Image(tool) => match tool {
                ImageTool::Compress => {
                    vec![OptionSpec::number("quality", QUALITY as f64, 0.01, 100.0)]
                }
                ImageTool::Resize => vec![
                    OptionSpec::number("width", RESIZE_WIDTH as f64, 1.0, 10000.0),
                    OptionSpec::number("height", RESIZE_HEIGHT as f64, 1.0, 10000.0),
                ],
                ImageTool::Convert => vec![OptionSpec::choice("format", IMAGE_FORMAT, IMAGE_FORMATS)],
                ImageTool::Rotate => vec![OptionSpec::choice_number("degrees", DEGREES, &["90", "180", "270"])],
                ImageTool::Flip => vec![OptionSpec::toggle("horizontal", true)],
                ImageTool::Crop => vec![
                    OptionSpec::number("x", 0.0, 0.0, 10000.0),
                    OptionSpec::number("y", 0.0, 0.0, 10000.0),
                    OptionSpec::number("width", CROP_SIZE as f64, 1.0, 10000.0),
                    OptionSpec::number("height", CROP_SIZE as f64, 1.0, 10000.0),
                ],
                ImageTool::Brightness => {
                    vec![OptionSpec::number("brightness", BRIGHTNESS as f64, -255.0, 255.0)]
                }
                ImageTool::Filters => vec![OptionSpec::text("filter", FILTER)],
                ImageTool::Blur => vec![OptionSpec::number("amount", BLUR, 0.0, 100.0)],
                ImageTool::Watermark => vec![OptionSpec::text("text", WATERMARK_TEXT)],
                ImageTool::Sharpen => Vec::new(),
            },
            Tool::Pdf(tool) => match tool {
                PdfTool::Split => vec![OptionSpec::ranges("ranges", &[&[0, 1]])],
                PdfTool::Rotate => vec![OptionSpec::choice_number("rotation", DEGREES, &["90", "180", "270"])],
                PdfTool::RemovePages | PdfTool::ExtractPages => {
                    vec![OptionSpec::pages("pageIndices", FIRST_PAGE)]
                }
                PdfTool::Organize => vec![OptionSpec::pages("pageOrder", PAGE_ORDER)],
                PdfTool::Watermark => {
                    let style = WatermarkStyle::default();
                    vec![
                        OptionSpec::text("text", WATERMARK_TEXT),
                        OptionSpec::number("opacity", style.opacity as f64, 0.0, 1.0),
                        OptionSpec::number("fontSize", style.font_size as f64, 1.0, 500.0),
                        OptionSpec::number("rotation", style.rotation as f64, -360.0, 360.0),
                    ]
                }
                PdfTool::PageNumbers => vec![
                    OptionSpec::choice(
                        "position",
                        "bottom-center",
                        &["bottom-left", "bottom-center", "bottom-right"],
                    ),
                    OptionSpec::number("startFrom", START_FROM as f64, 0.0, 100000.0),
                ],
                PdfTool::Merge | PdfTool::Compress | PdfTool::Repair | PdfTool::Info => Vec::new(),
            },
            Tool::Audio(tool) => match tool {
                AudioTool::Convert => vec![OptionSpec::choice("format", AUDIO_FORMAT, AUDIO_FORMATS)],
                AudioTool::Trim => trim_specs(),
                AudioTool::Volume => vec![OptionSpec::number("volume", VOLUME, 0.0, 10.0)],
                AudioTool::Speed => vec![speed_spec()],
                AudioTool::Fade => vec![
                    OptionSpec::number("fadeIn", FADE, 0.0, 3600.0),
                    OptionSpec::number("fadeOut", FADE, 0.0, 3600.0),
                ],
                AudioTool::Compress | AudioTool::Merge | AudioTool::Reverse => Vec::new(),
            },
            Tool::Video(tool) => match tool {
                VideoTool::Convert => vec![OptionSpec::choice("format", VIDEO_FORMAT, VIDEO_FORMATS)],
                VideoTool::Trim => trim_specs(),
                VideoTool::Rotate => vec![OptionSpec::choice_number("degrees", DEGREES, &["0", "90", "180", "270"])],
                VideoTool::Crop => vec![
                    OptionSpec::number("width", VIDEO_CROP_WIDTH as f64, 1.0, 10000.0),
                    OptionSpec::number("height", VIDEO_CROP_HEIGHT as f64, 1.0, 10000.0),
                    OptionSpec::number("x", 0.0, 0.0, 10000.0),
                    OptionSpec::number("y", 0.0, 0.0, 10000.0),
                ],
                VideoTool::Speed => vec![speed_spec()],
                VideoTool::Compress
                | VideoTool::ExtractAudio
                | VideoTool::ToGif
                | VideoTool::Merge
                | VideoTool::RemoveAudio
                | VideoTool::Reverse => Vec::new(),
            },
            Tool::Document(_) | Tool::Archive(_) => Vec::new(),
        }
    }
}

fn trim_specs() -> Vec<OptionSpec> {
    vec![
        OptionSpec::number("startTime", 0.0, 0.0, 86400.0),
        OptionSpec::number("duration", defaults::TRIM_DURATION, 0.1, 86400.0),
    ]
}

fn speed_spec() -> OptionSpec {
    let (low, high) = media::TEMPO_RANGE;
    OptionSpec::number("speed", defaults::SPEED, low, high)
}

/// A request to run one tool over one or more files
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub tool_name: String,
    pub files: Vec<InputFile>,
    pub options: ToolOptions,
    pub progress: Option<ProgressSink>,
}

impl ProcessingRequest {
    pub fn new(tool_name: impl Into<String>, files: Vec<InputFile>) -> Self {
        Self {
            tool_name: tool_name.into(),
            files,
            options: ToolOptions::default(),
            progress: None,
        }
    }

    pub fn with_options(mut self, options: ToolOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Output of a tool: one blob, or an ordered list for split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    Single(Blob),
    Multiple(Vec<Blob>),
}

impl ProcessingResult {
    pub fn blobs(&self) -> &[Blob] {
        match self {
            ProcessingResult::Single(blob) => std::slice::from_ref(blob),
            ProcessingResult::Multiple(blobs) => blobs,
        }
    }

    pub fn into_blobs(self) -> Vec<Blob> {
        match self {
            ProcessingResult::Single(blob) => vec![blob],
            ProcessingResult::Multiple(blobs) => blobs,
        }
    }

    /// Combined size of every output blob
    pub fn total_size(&self) -> u64 {
        self.blobs().iter().map(Blob::size).sum()
    }
}

/// Validates requests and runs tools
#[derive(Debug)]
pub struct Processor {
    limits: SizeLimits,
    max_files: usize,
    media: MediaRuntime,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(
            SizeLimits::default(),
            DEFAULT_MAX_FILES,
            MediaRuntime::new(EngineConfig::default()),
        )
    }
}

impl Processor {
    pub fn new(limits: SizeLimits, max_files: usize, media: MediaRuntime) -> Self {
        Self {
            limits,
            max_files,
            media,
        }
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    pub fn media(&self) -> &MediaRuntime {
        &self.media
    }

    /// Validate the request, resolve the tool and run it
    pub async fn process(&self, request: ProcessingRequest) -> Result<ProcessingResult, ToolError> {
        let ProcessingRequest {
            tool_name,
            files,
            options,
            progress,
        } = request;

        for warning in validate_request(&files, &self.limits)? {
            warn!("{}", warning);
        }

        if MULTI_FILE_TOOLS.contains(&tool_name.as_str())
            && !validate_file_count(files.len(), self.max_files).valid
        {
            return Err(ValidationError::TooManyFiles {
                max: self.max_files,
                actual: files.len(),
            }
            .into());
        }

        let first = files.first().ok_or(ValidationError::NoFiles)?;
        let tool = Tool::resolve(&tool_name, first)?;
        debug!(tool = %tool_name, resolved = ?tool, files = files.len(), "Dispatching tool");

        report(progress.as_ref(), 0);

        let result = match tool {
            Tool::Audio(tool) => {
                let job = audio_job(tool, &files, &options)?;
                return self.run_engine(job, progress.as_ref()).await;
            }
            Tool::Video(tool) => {
                let job = video_job(tool, &files, &options)?;
                return self.run_engine(job, progress.as_ref()).await;
            }
            Tool::Image(tool) => {
                blocking(move || run_image(tool, &files[0], &options).map(ProcessingResult::Single))
                    .await?
            }
            Tool::Pdf(tool) => blocking(move || run_pdf(tool, &files, &options)).await?,
            Tool::Document(tool) => {
                blocking(move || run_document(tool, &files[0]).map(ProcessingResult::Single)).await?
            }
            Tool::Archive(tool) => {
                blocking(move || run_archive(tool, &files).map(ProcessingResult::Single)).await?
            }
        };

        report(progress.as_ref(), 100);
        Ok(result)
    }

    async fn run_engine(
        &self,
        job: TranscodeJob,
        progress: Option<&ProgressSink>,
    ) -> Result<ProcessingResult, ToolError> {
        let blob = self.media.run(job, progress).await?;
        Ok(ProcessingResult::Single(blob))
    }
}

async fn blocking<F>(work: F) -> Result<ProcessingResult, ToolError>
where
    F: FnOnce() -> Result<ProcessingResult, ToolError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ToolError::Internal(e.to_string()))?
}

fn run_image(tool: ImageTool, file: &InputFile, options: &ToolOptions) -> Result<Blob, ToolError> {
    use defaults::*;

    let data = &file.data;
    let blob = match tool {
        ImageTool::Compress => image::compress_image(data, options.quality_or("quality", QUALITY)?)?,
        ImageTool::Resize => image::resize_image(
            data,
            options.u32_or("width", RESIZE_WIDTH)?,
            options.u32_or("height", RESIZE_HEIGHT)?,
        )?,
        ImageTool::Convert => image::convert_format(data, &options.str_or("format", IMAGE_FORMAT)?)?,
        ImageTool::Rotate => image::rotate_image(data, options.i64_or("degrees", DEGREES)?)?,
        ImageTool::Flip => image::flip_image(data, options.bool_or("horizontal", true)?)?,
        ImageTool::Crop => image::crop_image(
            data,
            options.u32_or("x", 0)?,
            options.u32_or("y", 0)?,
            options.u32_or("width", CROP_SIZE)?,
            options.u32_or("height", CROP_SIZE)?,
        )?,
        ImageTool::Brightness => {
            let delta = options.i64_or("brightness", BRIGHTNESS)?;
            let delta = i32::try_from(delta)
                .map_err(|_| OptionError::new("brightness", "a whole number between -255 and 255"))?;
            image::adjust_brightness(data, delta)?
        }
        ImageTool::Filters => image::apply_filters(data, &options.str_or("filter", FILTER)?)?,
        ImageTool::Blur => image::blur_image(data, options.f64_or("amount", BLUR)? as f32)?,
        ImageTool::Sharpen => image::sharpen_image(data)?,
        ImageTool::Watermark => image::add_watermark(data, &options.str_or("text", WATERMARK_TEXT)?)?,
    };
    Ok(blob)
}

fn pdf_blob(data: Vec<u8>) -> Blob {
    Blob::new(data, PDF_MIME)
}

fn run_pdf(
    tool: PdfTool,
    files: &[InputFile],
    options: &ToolOptions,
) -> Result<ProcessingResult, ToolError> {
    use defaults::*;

    let data = &files[0].data;
    let output = match tool {
        PdfTool::Merge => {
            let documents: Vec<Vec<u8>> = files.iter().map(|f| f.data.clone()).collect();
            pdf::merge_documents(&documents)?
        }
        PdfTool::Split => {
            let groups = options.ranges_or("ranges", &[vec![0, 1]])?;
            let ranges = pdf::resolve_all(&groups, pdf::page_count(data)?)?;
            let parts = pdf::split_document(data, &ranges)?;
            return Ok(ProcessingResult::Multiple(
                parts.into_iter().map(pdf_blob).collect(),
            ));
        }
        PdfTool::Rotate => pdf::rotate_pages(data, options.i64_or("rotation", DEGREES)?)?,
        PdfTool::RemovePages => {
            let pages = options.indices_or("pageIndices", FIRST_PAGE)?;
            pdf::remove_pages(data, &pages.resolve(pdf::page_count(data)?)?)?
        }
        PdfTool::ExtractPages => {
            let pages = options.indices_or("pageIndices", FIRST_PAGE)?;
            pdf::select_pages(data, &pages.resolve(pdf::page_count(data)?)?)?
        }
        PdfTool::Organize => {
            let order = options.indices_or("pageOrder", PAGE_ORDER)?;
            pdf::organize_pages(data, &order.resolve(pdf::page_count(data)?)?)?
        }
        PdfTool::Compress => pdf::compress_document(data)?,
        PdfTool::Watermark => {
            let base = WatermarkStyle::default();
            let style = WatermarkStyle {
                opacity: options.f64_or("opacity", base.opacity as f64)? as f32,
                font_size: options.f64_or("fontSize", base.font_size as f64)? as f32,
                rotation: options.f64_or("rotation", base.rotation as f64)? as f32,
            };
            pdf::add_watermark(data, &options.str_or("text", WATERMARK_TEXT)?, &style)?
        }
        PdfTool::PageNumbers => {
            let position = options.str_or("position", "bottom-center")?;
            let position = NumberPosition::parse(&position).ok_or_else(|| {
                OptionError::new("position", "bottom-left, bottom-center or bottom-right")
            })?;
            pdf::add_page_numbers(data, position, options.i64_or("startFrom", START_FROM)?)?
        }
        PdfTool::Repair => pdf::repair_document(data)?,
        PdfTool::Info => {
            let info = pdf::document_info(data)?;
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| ToolError::Internal(e.to_string()))?;
            return Ok(ProcessingResult::Single(Blob::text(json, document::JSON_MIME)));
        }
    };
    Ok(ProcessingResult::Single(pdf_blob(output)))
}

fn audio_job(
    tool: AudioTool,
    files: &[InputFile],
    options: &ToolOptions,
) -> Result<TranscodeJob, ToolError> {
    use defaults::*;

    let file = &files[0];
    let job = match tool {
        AudioTool::Convert => media::convert_audio(file, &options.str_or("format", AUDIO_FORMAT)?)?,
        AudioTool::Compress => media::compress_audio(file),
        AudioTool::Trim => media::trim_audio(
            file,
            options.f64_or("startTime", 0.0)?,
            options.f64_or("duration", TRIM_DURATION)?,
        )?,
        AudioTool::Merge => media::merge_audio(files)?,
        AudioTool::Volume => media::change_volume(file, options.f64_or("volume", VOLUME)?)?,
        AudioTool::Speed => media::change_audio_speed(file, options.f64_or("speed", SPEED)?)?,
        AudioTool::Fade => media::add_fade(
            file,
            options.f64_or("fadeIn", FADE)?,
            options.f64_or("fadeOut", FADE)?,
        )?,
        AudioTool::Reverse => media::reverse_audio(file),
    };
    Ok(job)
}

fn video_job(
    tool: VideoTool,
    files: &[InputFile],
    options: &ToolOptions,
) -> Result<TranscodeJob, ToolError> {
    use defaults::*;

    let file = &files[0];
    let job = match tool {
        VideoTool::Convert => media::convert_video(file, &options.str_or("format", VIDEO_FORMAT)?)?,
        VideoTool::Compress => media::compress_video(file),
        VideoTool::Trim => media::trim_video(
            file,
            options.f64_or("startTime", 0.0)?,
            options.f64_or("duration", TRIM_DURATION)?,
        )?,
        VideoTool::ExtractAudio => media::extract_audio(file),
        VideoTool::ToGif => media::video_to_gif(file),
        VideoTool::Rotate => media::rotate_video(file, options.i64_or("degrees", DEGREES)?)?,
        VideoTool::Merge => media::merge_videos(files)?,
        VideoTool::RemoveAudio => media::remove_audio(file),
        VideoTool::Crop => media::crop_video(
            file,
            options.u32_or("width", VIDEO_CROP_WIDTH)?,
            options.u32_or("height", VIDEO_CROP_HEIGHT)?,
            options.u32_or("x", 0)?,
            options.u32_or("y", 0)?,
        )?,
        VideoTool::Speed => media::change_video_speed(file, options.f64_or("speed", SPEED)?)?,
        VideoTool::Reverse => media::reverse_video(file),
    };
    Ok(job)
}

fn run_document(tool: DocumentTool, file: &InputFile) -> Result<Blob, ToolError> {
    let data = &file.data;
    let blob = match tool {
        DocumentTool::FormatJson => document::format_json(data)?,
        DocumentTool::MinifyJson => document::minify_json(data)?,
        DocumentTool::ValidateJson => document::validate_json(data)?,
        DocumentTool::JsonToCsv => document::json_to_csv(data)?,
        DocumentTool::CsvToJson => document::csv_to_json(data)?,
        DocumentTool::FormatXml => document::format_xml(data)?,
        DocumentTool::ValidateXml => document::validate_xml(data)?,
        DocumentTool::FormatCode(language) => document::format_code(data, language)?,
        DocumentTool::MinifyCode(language) => document::minify_code(data, language)?,
    };
    Ok(blob)
}

fn run_archive(tool: ArchiveTool, files: &[InputFile]) -> Result<Blob, ToolError> {
    let blob = match tool {
        ArchiveTool::Create => archive::create_zip_from_files(files)?,
        ArchiveTool::Extract => archive::extract_zip(&files[0].data)?,
        ArchiveTool::List => archive::list_contents(&files[0].data)?,
    };
    Ok(blob)
}
