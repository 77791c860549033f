//! Sprite sheet packer.
//!
//! Packs textures into a single sheet using shelf packing: tallest first,
//! left to right, a new shelf whenever a row is full.

use image::{imageops, RgbaImage};

/// A texture waiting to be packed.
#[derive(Debug, Clone)]
pub struct SheetSprite {
    pub name: String,
    pub image: RgbaImage,
}

/// Where a sprite landed on the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Sprite sheet packer using shelf (row-based) packing.
pub struct SheetPacker {
    pub padding: u32,
}

impl SheetPacker {
    pub fn new(padding: u32) -> Self {
        Self { padding }
    }

    /// Pack sprites into a sheet.
    ///
    /// Returns the composited image and one frame per sprite, in input order.
    pub fn pack(&self, sprites: &[SheetSprite]) -> (RgbaImage, Vec<Frame>) {
        if sprites.is_empty() {
            return (RgbaImage::new(0, 0), Vec::new());
        }

        // Build index sorted by height descending (stable sort preserves input order)
        let mut indices: Vec<usize> = (0..sprites.len()).collect();
        indices.sort_by(|&a, &b| {
            sprites[b]
                .image
                .height()
                .cmp(&sprites[a].image.height())
                .then_with(|| a.cmp(&b))
        });

        // Compute sheet width as smallest power-of-two that fits
        let max_w = sprites.iter().map(|s| s.image.width()).max().unwrap_or(1);
        let total_area: u64 = sprites
            .iter()
            .map(|s| {
                (s.image.width() + self.padding) as u64 * (s.image.height() + self.padding) as u64
            })
            .sum();
        let sqrt_area = (total_area as f64).sqrt().ceil() as u32;
        let sheet_width = next_power_of_two(max_w.max(sqrt_area));

        // Shelf-pack: place sprites left-to-right, new row when full
        let mut cursor_x: u32 = 0;
        let mut cursor_y: u32 = 0;
        let mut row_height: u32 = 0;
        let mut placements: Vec<(u32, u32)> = vec![(0, 0); sprites.len()];

        for &idx in &indices {
            let w = sprites[idx].image.width();
            let h = sprites[idx].image.height();

            if cursor_x + w > sheet_width && cursor_x > 0 {
                cursor_y += row_height + self.padding;
                cursor_x = 0;
                row_height = 0;
            }

            placements[idx] = (cursor_x, cursor_y);
            row_height = row_height.max(h);
            cursor_x += w + self.padding;
        }

        let sheet_height = cursor_y + row_height;
        let mut sheet = RgbaImage::new(sheet_width, sheet_height);
        let mut frames = Vec::with_capacity(sprites.len());

        for (sprite, &(x, y)) in sprites.iter().zip(&placements) {
            imageops::replace(&mut sheet, &sprite.image, x as i64, y as i64);
            frames.push(Frame {
                name: sprite.name.clone(),
                x,
                y,
                w: sprite.image.width(),
                h: sprite.image.height(),
            });
        }

        (sheet, frames)
    }
}

/// Find the smallest power of two >= n.
fn next_power_of_two(n: u32) -> u32 {
    if n == 0 {
        return 1;
    }
    n.next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn make_sprite(name: &str, w: u32, h: u32) -> SheetSprite {
        SheetSprite {
            name: name.to_string(),
            image: RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])),
        }
    }

    fn overlaps(a: &Frame, b: &Frame) -> bool {
        !(b.x >= a.x + a.w || a.x >= b.x + b.w || b.y >= a.y + a.h || a.y >= b.y + b.h)
    }

    #[test]
    fn test_pack_empty() {
        let packer = SheetPacker::new(0);
        let (sheet, frames) = packer.pack(&[]);
        assert_eq!(sheet.width(), 0);
        assert_eq!(sheet.height(), 0);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_pack_single_sprite() {
        let packer = SheetPacker::new(0);
        let (sheet, frames) = packer.pack(&[make_sprite("a", 4, 4)]);

        assert_eq!(
            frames,
            vec![Frame {
                name: "a".to_string(),
                x: 0,
                y: 0,
                w: 4,
                h: 4
            }]
        );
        assert!(sheet.width().is_power_of_two());
    }

    #[test]
    fn test_pack_different_sizes() {
        let packer = SheetPacker::new(0);
        let sprites = vec![
            make_sprite("tall", 2, 8),
            make_sprite("wide", 8, 2),
            make_sprite("small", 2, 2),
        ];
        let (sheet, frames) = packer.pack(&sprites);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].name, "tall");
        for i in 0..frames.len() {
            assert!(frames[i].x + frames[i].w <= sheet.width());
            assert!(frames[i].y + frames[i].h <= sheet.height());
            for j in (i + 1)..frames.len() {
                assert!(
                    !overlaps(&frames[i], &frames[j]),
                    "frames {} and {} overlap",
                    frames[i].name,
                    frames[j].name
                );
            }
        }
    }

    #[test]
    fn test_pack_with_padding() {
        let packer = SheetPacker::new(2);
        let (_, frames) = packer.pack(&[make_sprite("a", 4, 4), make_sprite("b", 4, 4)]);
        let (a, b) = (&frames[0], &frames[1]);
        let gap_x = b.x.saturating_sub(a.x + a.w);
        let gap_y = b.y.saturating_sub(a.y + a.h);
        assert!(gap_x >= 2 || gap_y >= 2, "a={:?} b={:?}", a, b);
    }

    #[test]
    fn test_pack_preserves_pixel_data() {
        let packer = SheetPacker::new(0);
        let red = SheetSprite {
            name: "a".to_string(),
            image: RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255])),
        };
        let blue = SheetSprite {
            name: "b".to_string(),
            image: RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 128])),
        };

        let (sheet, frames) = packer.pack(&[red, blue]);

        assert_eq!(sheet.get_pixel(frames[0].x, frames[0].y).0, [255, 0, 0, 255]);
        assert_eq!(sheet.get_pixel(frames[1].x, frames[1].y).0, [0, 0, 255, 128]);
    }

    #[test]
    fn test_sheet_width_is_power_of_two() {
        let packer = SheetPacker::new(0);
        let sprites = vec![
            make_sprite("a", 5, 1),
            make_sprite("b", 5, 1),
            make_sprite("c", 5, 1),
        ];
        let (sheet, _) = packer.pack(&sprites);
        assert!(sheet.width().is_power_of_two(), "sheet width {}", sheet.width());
    }

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(17), 32);
    }
}
