use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Points},
        Widget,
    },
};
use reqwest::Client;

const FLAG_CDN: &str = "https://flagcdn.com/w80";

pub fn flag_key(country_code: &str) -> String {
    country_code.to_lowercase()
}

pub fn flag_url(country_code: &str) -> String {
    format!("{}/{}.png", FLAG_CDN, flag_key(country_code))
}

pub async fn fetch_flag(client: &Client, country_code: &str) -> Result<DynamicImage> {
    let url = flag_url(country_code);
    let bytes = client
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("failed to download {url}"))?
        .bytes()
        .await?;
    image::load_from_memory(&bytes).with_context(|| format!("failed to decode {url}"))
}

/// Decoded flags keyed by lowercased country code.
#[derive(Debug)]
pub struct FlagCache {
    images: HashMap<String, DynamicImage>,
    requested: HashSet<String>,
    enabled: bool,
    pub visible: bool,
}

impl FlagCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            images: HashMap::new(),
            requested: HashSet::new(),
            enabled,
            visible: enabled,
        }
    }

    /// Codes that still need a download. Each code is handed out once,
    /// failed downloads are not retried.
    pub fn claim_missing<I, S>(&mut self, codes: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.enabled {
            return Vec::new();
        }
        codes
            .into_iter()
            .map(|c| flag_key(c.as_ref()))
            .filter(|key| self.requested.insert(key.clone()))
            .collect()
    }

    pub fn insert(&mut self, country_code: &str, img: DynamicImage) {
        self.images.insert(flag_key(country_code), img);
    }

    pub fn get(&self, country_code: &str) -> Option<&DynamicImage> {
        if !self.visible {
            return None;
        }
        self.images.get(&flag_key(country_code))
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

/// Flag shrunk to `width` upper-half blocks, two pixel rows per cell, for use
/// inside a line of text.
pub fn inline_flag(img: &DynamicImage, width: u16) -> Vec<Span<'static>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let cols = width as u32;
    (0..cols)
        .map(|x| {
            let img_x = (2 * x + 1) * w / (2 * cols);
            let top = img.get_pixel(img_x, h / 4);
            let bottom = img.get_pixel(img_x, 3 * h / 4);
            Span::styled(
                "▀",
                Style::default()
                    .fg(Color::Rgb(top[0], top[1], top[2]))
                    .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
            )
        })
        .collect()
}

/// Paints a flag with braille dots, one dot per sampled pixel.
pub struct FlagWidget<'a> {
    img: &'a DynamicImage,
}

impl<'a> FlagWidget<'a> {
    pub fn new(img: &'a DynamicImage) -> Self {
        Self { img }
    }
}

impl Widget for FlagWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        // Braille cells are 2 dots wide and 4 dots tall.
        let dots_x = area.width as u32 * 2;
        let dots_y = area.height as u32 * 4;
        let (w, h) = self.img.dimensions();

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, dots_x as f64])
            .y_bounds([0.0, dots_y as f64])
            .paint(|ctx| {
                for y in 0..dots_y {
                    for x in 0..dots_x {
                        let img_x = x * w / dots_x;
                        let img_y = y * h / dots_y;
                        if img_x < w && img_y < h {
                            let p = self.img.get_pixel(img_x, img_y);
                            if p[3] > 128 {
                                ctx.draw(&Points {
                                    coords: &[(x as f64, (dots_y - y) as f64)],
                                    color: Color::Rgb(p[0], p[1], p[2]),
                                });
                            }
                        }
                    }
                }
            })
            .render(area, buf);
    }
}
