//! Scattering distribution functions.
//!
//! Everything here works in the local shading frame with the surface
//! normal along `(0, 1, 0)`. `out_dir` points from the surface toward
//! the viewer; sampling produces the incoming direction. Returned
//! attenuations follow the integrator convention of already being
//! divided by the sample's pdf, which lets the delta lobes (mirror,
//! glass) report attenuation 1 with pdf 1.

use glint_math::Vec3;
use rand::RngCore;
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// RGB radiance/reflectance triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spectrum {
    /// Red component.
    pub r: f64,
    /// Green component.
    pub g: f64,
    /// Blue component.
    pub b: f64,
}

impl Spectrum {
    /// From explicit components.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// The same value on all three channels.
    pub fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// No energy.
    pub fn black() -> Self {
        Self::splat(0.0)
    }

    /// Whether every channel is zero.
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

impl Add for Spectrum {
    type Output = Spectrum;
    fn add(self, o: Spectrum) -> Spectrum {
        Spectrum::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

impl Mul for Spectrum {
    type Output = Spectrum;
    fn mul(self, o: Spectrum) -> Spectrum {
        Spectrum::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
}

impl Mul<f64> for Spectrum {
    type Output = Spectrum;
    fn mul(self, s: f64) -> Spectrum {
        Spectrum::new(self.r * s, self.g * s, self.b * s)
    }
}

/// One BSDF sample: an incoming direction with its weight.
#[derive(Debug, Clone, Copy)]
pub struct Scatter {
    /// Sampled incoming direction in the local frame.
    pub direction: Vec3,
    /// Reflectance weight, already divided by `pdf`.
    pub attenuation: Spectrum,
    /// Probability (density) of this sample; 1 for delta lobes.
    pub pdf: f64,
    /// Radiance emitted toward `out_dir`, for emitters.
    pub emissive: Spectrum,
}

/// The supported surface models, dispatched once per hit.
#[derive(Debug, Clone, Copy)]
pub enum Bsdf {
    /// Cosine-weighted diffuse reflector.
    Lambertian {
        /// Diffuse reflectance.
        albedo: Spectrum,
    },
    /// Perfect specular reflector.
    Mirror,
    /// Dielectric: Fresnel-weighted choice of reflection or refraction.
    Glass {
        /// Index of refraction.
        ior: f64,
    },
    /// Pure refractor (no Fresnel reflection).
    Refract {
        /// Index of refraction.
        ior: f64,
    },
    /// Diffuse area-light emitter; absorbs all incoming light.
    Emissive {
        /// Emitted radiance.
        radiance: Spectrum,
    },
}

impl Bsdf {
    /// Sample an incoming direction for light leaving along `out_dir`.
    pub fn sample(&self, out_dir: Vec3, rng: &mut dyn RngCore) -> Scatter {
        match *self {
            Bsdf::Lambertian { albedo } => {
                let (direction, pdf) = cosine_hemisphere(rng);
                Scatter {
                    direction,
                    attenuation: if out_dir.y > 0.0 {
                        albedo * (1.0 / PI)
                    } else {
                        Spectrum::black()
                    },
                    pdf,
                    emissive: Spectrum::black(),
                }
            }
            Bsdf::Mirror => Scatter {
                direction: reflect(out_dir),
                attenuation: if out_dir.y > 0.0 {
                    Spectrum::splat(1.0)
                } else {
                    Spectrum::black()
                },
                pdf: 1.0,
                emissive: Spectrum::black(),
            },
            Bsdf::Glass { ior } => {
                let mut was_internal = false;
                let refracted = refract(out_dir, ior, &mut was_internal);
                let direction = if was_internal {
                    reflect(out_dir)
                } else {
                    // Exact dielectric Fresnel: average the squared
                    // parallel and perpendicular amplitude ratios.
                    let (eta_i, eta_t) = if out_dir.y > 0.0 { (1.0, ior) } else { (ior, 1.0) };
                    let s_i = out_dir.y.abs();
                    let s_t = refracted.y.abs();
                    let r_par = (eta_t * s_i - eta_i * s_t) / (eta_t * s_i + eta_i * s_t);
                    let r_perp = (eta_i * s_i - eta_t * s_t) / (eta_i * s_i + eta_t * s_t);
                    let fresnel = (r_par * r_par + r_perp * r_perp) * 0.5;
                    if coin_flip(rng, fresnel) {
                        reflect(out_dir)
                    } else {
                        refracted
                    }
                };
                Scatter {
                    direction,
                    attenuation: Spectrum::splat(1.0),
                    pdf: 1.0,
                    emissive: Spectrum::black(),
                }
            }
            Bsdf::Refract { ior } => {
                let mut was_internal = false;
                let direction = refract(out_dir, ior, &mut was_internal);
                Scatter {
                    direction,
                    attenuation: Spectrum::splat(1.0),
                    pdf: 1.0,
                    emissive: Spectrum::black(),
                }
            }
            Bsdf::Emissive { radiance } => {
                let (direction, pdf) = cosine_hemisphere(rng);
                Scatter {
                    direction,
                    attenuation: Spectrum::black(),
                    pdf,
                    emissive: radiance,
                }
            }
        }
    }

    /// Evaluate the reflectance for a given direction pair.
    ///
    /// Defined for the diffuse lobe only; two independently sampled
    /// directions never line up with a delta lobe exactly, so the
    /// specular models always evaluate to zero.
    pub fn evaluate(&self, _out_dir: Vec3, _in_dir: Vec3) -> Spectrum {
        match *self {
            Bsdf::Lambertian { albedo } => albedo * (1.0 / PI),
            _ => Spectrum::black(),
        }
    }

    /// Whether sampling is a delta distribution (pdf is a point mass).
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Bsdf::Mirror | Bsdf::Glass { .. } | Bsdf::Refract { .. }
        )
    }

    /// Whether this surface emits light.
    pub fn is_emissive(&self) -> bool {
        matches!(self, Bsdf::Emissive { .. })
    }
}

/// Mirror a direction about the local normal `(0, 1, 0)`.
pub fn reflect(dir: Vec3) -> Vec3 {
    Vec3::new(-dir.x, dir.y, -dir.z)
}

/// Refract `out_dir` through the surface by Snell's law.
///
/// `out_dir.y > 0` means the ray is on the outside (entering a medium
/// of the given index); otherwise it is leaving it. Refraction is
/// symmetric, so both cases reduce to scaling the tangential components
/// by the index ratio. On total internal reflection the reflected
/// direction is returned and `was_internal` is set.
pub fn refract(out_dir: Vec3, ior: f64, was_internal: &mut bool) -> Vec3 {
    let (eta_i, eta_t) = if out_dir.y > 0.0 { (1.0, ior) } else { (ior, 1.0) };
    let eta = eta_i / eta_t;
    let x = -out_dir.x * eta;
    let z = -out_dir.z * eta;
    let y_sq = 1.0 - x * x - z * z;
    if y_sq <= 0.0 {
        *was_internal = true;
        return reflect(out_dir);
    }
    *was_internal = false;
    let y = if out_dir.y > 0.0 { -y_sq.sqrt() } else { y_sq.sqrt() };
    Vec3::new(x, y, z)
}

/// Cosine-weighted hemisphere sample about `(0, 1, 0)` with its pdf.
fn cosine_hemisphere(rng: &mut dyn RngCore) -> (Vec3, f64) {
    let r1 = uniform(rng);
    let r2 = uniform(rng);
    let radius = r1.sqrt();
    let phi = 2.0 * PI * r2;
    let y = (1.0 - r1).sqrt();
    let dir = Vec3::new(radius * phi.cos(), y, radius * phi.sin());
    (dir, y / PI)
}

/// Uniform f64 in `[0, 1)` from an object-safe rng.
fn uniform(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Biased coin flip: true with probability `p`.
fn coin_flip(rng: &mut dyn RngCore, p: f64) -> bool {
    uniform(rng) < p
}
