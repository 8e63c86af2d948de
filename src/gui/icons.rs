//! Icon textures loaded from `<icon_dir>/<id>.png` off the UI thread

use anyhow::{Context, Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, error, warn};

use eframe::egui;

/// Decoded RGBA pixels
pub struct IconImage {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

pub fn decode_icon(path: &Path) -> Result<IconImage> {
    let file = File::open(path).context(format!("Failed to open icon {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    // 8 bits per channel after these
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().context(format!("Failed to read icon header {}", path.display()))?;
    let (color_type, _) = reader.output_color_type();
    let (width, height) = (reader.info().width as usize, reader.info().height as usize);
    let mut buf = vec![0; width * height * color_type.samples()];
    let info = reader
        .next_frame(&mut buf)
        .context(format!("Failed to decode icon {}", path.display()))?;
    let pixels = &buf[..info.buffer_size()];

    let rgba = match info.color_type {
        png::ColorType::Rgba => pixels.to_vec(),
        png::ColorType::Rgb => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0xFF])
            .collect(),
        png::ColorType::GrayscaleAlpha => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => pixels.iter().flat_map(|&g| [g, g, g, 0xFF]).collect(),
        other => return Err(anyhow!("Unsupported icon color type {other:?} in {}", path.display())),
    };

    Ok(IconImage {
        size: [info.width as usize, info.height as usize],
        rgba,
    })
}

pub enum IconLookup {
    Loading,
    Ready(egui::TextureHandle),
    Missing,
}

enum Slot {
    Pending,
    Ready(egui::TextureHandle),
    Missing,
}

/// Texture cache fed by a decoder thread
pub struct IconCache {
    dir: PathBuf,
    slots: HashMap<u32, Slot>,
    requests: Sender<(u32, PathBuf)>,
    results: Receiver<(u32, Result<IconImage>)>,
    warned: HashSet<u32>,
}

impl IconCache {
    pub fn new(dir: PathBuf) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<(u32, PathBuf)>();
        let (result_tx, result_rx) = mpsc::channel();
        thread::Builder::new()
            .name("icon-loader".to_string())
            .spawn(move || {
                for (id, path) in request_rx {
                    if result_tx.send((id, decode_icon(&path))).is_err() {
                        break;
                    }
                }
                debug!("Icon loader stopped");
            })
            .context("Failed to spawn icon loader thread")?;

        debug!(dir = %dir.display(), "Icon cache ready");
        Ok(Self {
            dir,
            slots: HashMap::new(),
            requests: request_tx,
            results: result_rx,
            warned: HashSet::new(),
        })
    }

    /// Switches directories, dropping everything loaded so far
    pub fn set_dir(&mut self, dir: PathBuf) {
        if dir != self.dir {
            self.dir = dir;
            self.slots.clear();
            self.warned.clear();
        }
    }

    /// Uploads whatever the loader finished
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.results.try_recv() {
            let slot = match result {
                Ok(image) => {
                    let color = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba);
                    Slot::Ready(ctx.load_texture(format!("icon-{id}"), color, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    if self.warned.insert(id) {
                        warn!(id, error = ?e, "Icon unavailable");
                    }
                    Slot::Missing
                }
            };
            self.slots.insert(id, slot);
        }
    }

    pub fn get(&mut self, id: u32) -> IconLookup {
        match self.slots.get(&id) {
            Some(Slot::Ready(texture)) => IconLookup::Ready(texture.clone()),
            Some(Slot::Missing) => IconLookup::Missing,
            Some(Slot::Pending) => IconLookup::Loading,
            None => {
                let path = self.dir.join(format!("{id}.png"));
                if self.requests.send((id, path)).is_err() {
                    error!(id, "Icon loader is gone");
                    self.slots.insert(id, Slot::Missing);
                    return IconLookup::Missing;
                }
                self.slots.insert(id, Slot::Pending);
                IconLookup::Loading
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, color: png::ColorType, data: &[u8], width: u32, height: u32) {
        let file = File::create(path).unwrap();
        let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }

    #[test]
    fn test_decode_rgb_adds_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("7.png");
        write_png(&path, png::ColorType::Rgb, &[255, 0, 0, 0, 255, 0], 2, 1);

        let icon = decode_icon(&path).unwrap();
        assert_eq!(icon.size, [2, 1]);
        assert_eq!(icon.rgba, vec![255, 0, 0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(decode_icon(&dir.path().join("404.png")).is_err());
    }
}
