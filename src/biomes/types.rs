// ============================================
// Biome Types - Пресеты биомов (цвета воды и тумана)
// ============================================

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// Линейный цвет RGBA
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        self + (other + self * -1.0) * t
    }
}

impl Add for Rgba {
    type Output = Rgba;
    fn add(self, o: Rgba) -> Rgba {
        Rgba::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Mul<f32> for Rgba {
    type Output = Rgba;
    fn mul(self, k: f32) -> Rgba {
        Rgba::new(self.r * k, self.g * k, self.b * k, self.a * k)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// (value - a) / (b - a), зажато в 0..1
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Интерполируемые параметры биома
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeParams {
    pub shallow_color: Rgba,
    pub deep_color: Rgba,
    pub start_fog_color: Rgba,
    pub end_fog_color: Rgba,
    pub start_fog_density: f32,
    pub end_fog_density: f32,
}

impl BiomeParams {
    /// Все поля в нуле: стартовая точка накопления весов
    pub const BLANK: BiomeParams = BiomeParams {
        shallow_color: Rgba::TRANSPARENT,
        deep_color: Rgba::TRANSPARENT,
        start_fog_color: Rgba::TRANSPARENT,
        end_fog_color: Rgba::TRANSPARENT,
        start_fog_density: 0.0,
        end_fog_density: 0.0,
    };

    /// self += source · weight (покомпонентно)
    pub fn add_fraction(&mut self, source: &BiomeParams, weight: f32) {
        self.shallow_color = self.shallow_color + source.shallow_color * weight;
        self.deep_color = self.deep_color + source.deep_color * weight;
        self.start_fog_color = self.start_fog_color + source.start_fog_color * weight;
        self.end_fog_color = self.end_fog_color + source.end_fog_color * weight;
        self.start_fog_density += source.start_fog_density * weight;
        self.end_fog_density += source.end_fog_density * weight;
    }

    pub fn lerp(&self, other: &BiomeParams, t: f32) -> BiomeParams {
        BiomeParams {
            shallow_color: self.shallow_color.lerp(other.shallow_color, t),
            deep_color: self.deep_color.lerp(other.deep_color, t),
            start_fog_color: self.start_fog_color.lerp(other.start_fog_color, t),
            end_fog_color: self.end_fog_color.lerp(other.end_fog_color, t),
            start_fog_density: lerp(self.start_fog_density, other.start_fog_density, t),
            end_fog_density: lerp(self.end_fog_density, other.end_fog_density, t),
        }
    }
}

/// Именованный пресет
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub name: String,
    pub params: BiomeParams,
}

impl Biome {
    pub fn new(name: &str, params: BiomeParams) -> Self {
        Self { name: name.to_string(), params }
    }
}

/// Результат запроса к блендеру
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    pub params: BiomeParams,
    /// Индекс листа с наибольшим весом
    pub dominant: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_lerp_reversed_band() {
        // Полоса задана от high к low
        assert!((inverse_lerp(0.54, 0.46, 0.5) - 0.5).abs() < 1e-5);
        assert_eq!(inverse_lerp(0.54, 0.46, 0.0), 1.0);
        assert_eq!(inverse_lerp(0.54, 0.46, 1.0), 0.0);
    }

    #[test]
    fn test_add_fraction_matches_lerp() {
        let a = BiomeParams { start_fog_density: 0.2, shallow_color: Rgba::new(1.0, 0.0, 0.0, 1.0), ..BiomeParams::BLANK };
        let b = BiomeParams { start_fog_density: 0.6, shallow_color: Rgba::new(0.0, 1.0, 0.0, 1.0), ..BiomeParams::BLANK };

        let mut acc = BiomeParams::BLANK;
        acc.add_fraction(&a, 0.25);
        acc.add_fraction(&b, 0.75);
        let expected = a.lerp(&b, 0.75);

        assert!((acc.start_fog_density - expected.start_fog_density).abs() < 1e-6);
        assert!((acc.shallow_color.g - expected.shallow_color.g).abs() < 1e-6);
        assert!((acc.shallow_color.a - 1.0).abs() < 1e-6);
    }
}
