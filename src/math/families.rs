use std::f64::consts::{FRAC_PI_2, PI, SQRT_2, TAU};
use std::fmt;
use std::str::FromStr;

use glam::DVec3;

use crate::error::PlotError;

/// Parameter step used when a family has no closed-form partial derivatives.
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceFamily {
    Astroid,
    AstroidalTorus,
    BohemianDome,
    BoyShape,
    Breather,
    Cyclide,
    Enneper,
    Figure8,
    Henneberg,
    Kiss,
    KleinBottle,
    Kuen,
    Minimal,
    Pear,
    PluckerConoid,
    Seashell,
    Steiner,
    Torus,
    Wellenkugel,
    Peaks,
    Poles,
    Sinc,
}

/// Parameter rectangle of a family. A periodic direction satisfies
/// `f(max, ·) == f(min, ·)` exactly, so the grid can close on itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub u: (f64, f64),
    pub v: (f64, f64),
    pub periodic_u: bool,
    pub periodic_v: bool,
}

impl Domain {
    const fn open(u: (f64, f64), v: (f64, f64)) -> Self {
        Self {
            u,
            v,
            periodic_u: false,
            periodic_v: false,
        }
    }

    const fn wrap_v(u: (f64, f64), v: (f64, f64)) -> Self {
        Self {
            u,
            v,
            periodic_u: false,
            periodic_v: true,
        }
    }

    const fn wrap_both(u: (f64, f64), v: (f64, f64)) -> Self {
        Self {
            u,
            v,
            periodic_u: true,
            periodic_v: true,
        }
    }

    pub fn u_at(&self, i: usize, nu: usize) -> f64 {
        self.u.0 + (self.u.1 - self.u.0) * i as f64 / nu as f64
    }

    pub fn v_at(&self, j: usize, nv: usize) -> f64 {
        self.v.0 + (self.v.1 - self.v.0) * j as f64 / nv as f64
    }
}

impl SurfaceFamily {
    pub const ALL: [SurfaceFamily; 22] = [
        SurfaceFamily::Astroid,
        SurfaceFamily::AstroidalTorus,
        SurfaceFamily::BohemianDome,
        SurfaceFamily::BoyShape,
        SurfaceFamily::Breather,
        SurfaceFamily::Cyclide,
        SurfaceFamily::Enneper,
        SurfaceFamily::Figure8,
        SurfaceFamily::Henneberg,
        SurfaceFamily::Kiss,
        SurfaceFamily::KleinBottle,
        SurfaceFamily::Kuen,
        SurfaceFamily::Minimal,
        SurfaceFamily::Pear,
        SurfaceFamily::PluckerConoid,
        SurfaceFamily::Seashell,
        SurfaceFamily::Steiner,
        SurfaceFamily::Torus,
        SurfaceFamily::Wellenkugel,
        SurfaceFamily::Peaks,
        SurfaceFamily::Poles,
        SurfaceFamily::Sinc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SurfaceFamily::Astroid => "astroid",
            SurfaceFamily::AstroidalTorus => "astroidalTorus",
            SurfaceFamily::BohemianDome => "bohemianDome",
            SurfaceFamily::BoyShape => "boyShape",
            SurfaceFamily::Breather => "breather",
            SurfaceFamily::Cyclide => "cyclide",
            SurfaceFamily::Enneper => "enneper",
            SurfaceFamily::Figure8 => "figure8",
            SurfaceFamily::Henneberg => "henneberg",
            SurfaceFamily::Kiss => "kiss",
            SurfaceFamily::KleinBottle => "kleinBottle",
            SurfaceFamily::Kuen => "kuen",
            SurfaceFamily::Minimal => "minimal",
            SurfaceFamily::Pear => "pear",
            SurfaceFamily::PluckerConoid => "pluckerConoid",
            SurfaceFamily::Seashell => "seashell",
            SurfaceFamily::Steiner => "steiner",
            SurfaceFamily::Torus => "torus",
            SurfaceFamily::Wellenkugel => "wellenkugel",
            SurfaceFamily::Peaks => "peaks",
            SurfaceFamily::Poles => "poles",
            SurfaceFamily::Sinc => "sinc",
        }
    }

    /// Height fields `y = h(x, z, t)` whose shape changes with time.
    pub fn is_animated(self) -> bool {
        matches!(
            self,
            SurfaceFamily::Peaks | SurfaceFamily::Poles | SurfaceFamily::Sinc
        )
    }

    pub fn domain(self) -> Domain {
        match self {
            SurfaceFamily::Astroid => Domain {
                u: (0.0, TAU),
                v: (-FRAC_PI_2, FRAC_PI_2),
                periodic_u: true,
                periodic_v: false,
            },
            SurfaceFamily::AstroidalTorus => Domain::wrap_both((0.0, TAU), (0.0, TAU)),
            SurfaceFamily::BohemianDome => Domain::wrap_both((0.0, TAU), (0.0, TAU)),
            SurfaceFamily::BoyShape => Domain::open((-FRAC_PI_2, FRAC_PI_2), (0.0, PI)),
            SurfaceFamily::Breather => Domain::open((-14.0, 14.0), (-37.4, 37.4)),
            SurfaceFamily::Cyclide => Domain::wrap_both((0.0, TAU), (0.0, TAU)),
            SurfaceFamily::Enneper => Domain::open((-2.0, 2.0), (-2.0, 2.0)),
            SurfaceFamily::Figure8 => Domain::wrap_v((0.0, TAU), (0.0, TAU)),
            SurfaceFamily::Henneberg => Domain::wrap_v((0.05, 1.0), (0.0, TAU)),
            SurfaceFamily::Kiss => Domain::wrap_v((-0.99, 0.99), (0.0, TAU)),
            SurfaceFamily::KleinBottle => Domain::wrap_v((0.0, PI), (0.0, TAU)),
            SurfaceFamily::Kuen => Domain::open((-4.5, 4.5), (-3.5, 3.5)),
            SurfaceFamily::Minimal => Domain::open((-PI, 3.0 * PI), (-2.0, 2.0)),
            SurfaceFamily::Pear => Domain::wrap_v((0.0, 1.0), (0.0, TAU)),
            SurfaceFamily::PluckerConoid => Domain::wrap_v((-1.0, 1.0), (0.0, TAU)),
            SurfaceFamily::Seashell => Domain::wrap_v((0.0, 6.0 * PI), (0.0, TAU)),
            SurfaceFamily::Steiner => Domain::open((0.0, PI), (-FRAC_PI_2, FRAC_PI_2)),
            SurfaceFamily::Torus => Domain::wrap_both((0.0, TAU), (0.0, TAU)),
            SurfaceFamily::Wellenkugel => Domain::wrap_v((0.0, 14.5), (0.0, TAU)),
            SurfaceFamily::Peaks => Domain::open((-3.0, 3.0), (-3.0, 3.0)),
            SurfaceFamily::Poles => Domain::open((-3.0, 3.0), (-3.0, 3.0)),
            SurfaceFamily::Sinc => Domain::open((-8.0, 8.0), (-8.0, 8.0)),
        }
    }

    pub fn position(self, u: f64, v: f64, t: f64) -> DVec3 {
        match self {
            SurfaceFamily::Astroid => {
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                DVec3::new((cu * cv).powi(3), sv.powi(3), (su * cv).powi(3))
            }
            SurfaceFamily::AstroidalTorus => {
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let r = 2.0 + cu.powi(3);
                DVec3::new(r * cv, su.powi(3), r * sv)
            }
            SurfaceFamily::BohemianDome => {
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                DVec3::new(0.5 * cu, 0.5 * su + 1.5 * cv, sv)
            }
            SurfaceFamily::BoyShape => {
                let cv2 = v.cos().powi(2);
                let s2v = (2.0 * v).sin();
                let d = 2.0 - SQRT_2 * (3.0 * u).sin() * s2v;
                DVec3::new(
                    (SQRT_2 * cv2 * (2.0 * u).cos() + u.cos() * s2v) / d,
                    3.0 * cv2 / d,
                    (SQRT_2 * cv2 * (2.0 * u).sin() - u.sin() * s2v) / d,
                )
            }
            SurfaceFamily::Breather => {
                let a: f64 = 0.4;
                let w = (1.0 - a * a).sqrt();
                let ch = (a * u).cosh();
                let (swv, cwv) = (w * v).sin_cos();
                let (sv, cv) = v.sin_cos();
                let d = a * ((w * ch).powi(2) + (a * swv).powi(2));
                DVec3::new(
                    -u + 2.0 * (1.0 - a * a) * ch * (a * u).sinh() / d,
                    2.0 * w * ch * (-(w * cv * cwv) - sv * swv) / d,
                    2.0 * w * ch * (-(w * sv * cwv) + cv * swv) / d,
                )
            }
            SurfaceFamily::Cyclide => {
                let (a, b, c, d) = (1.0, 0.98, 0.199, 0.3);
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let den = a - c * cu * cv;
                DVec3::new(
                    (d * (c - a * cu * cv) + b * b * cu) / den,
                    b * sv * (c * cu - d) / den,
                    b * su * (a - d * cv) / den,
                )
            }
            SurfaceFamily::Enneper => DVec3::new(
                u - u.powi(3) / 3.0 + u * v * v,
                u * u - v * v,
                v - v.powi(3) / 3.0 + v * u * u,
            ),
            SurfaceFamily::Figure8 => {
                let r = 2.0;
                let (sh, ch) = (0.5 * u).sin_cos();
                let sv = v.sin();
                let s2v = (2.0 * v).sin();
                let w = r + ch * sv - sh * s2v;
                DVec3::new(w * u.cos(), sh * sv + ch * s2v, w * u.sin())
            }
            SurfaceFamily::Henneberg => DVec3::new(
                2.0 * u.sinh() * v.cos() - 2.0 / 3.0 * (3.0 * u).sinh() * (3.0 * v).cos(),
                2.0 * (2.0 * u).cosh() * (2.0 * v).cos(),
                2.0 * u.sinh() * v.sin() + 2.0 / 3.0 * (3.0 * u).sinh() * (3.0 * v).sin(),
            ),
            SurfaceFamily::Kiss => {
                let r = u * u * (1.0 - u).sqrt();
                DVec3::new(r * v.cos(), u, r * v.sin())
            }
            SurfaceFamily::KleinBottle => {
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let x = -2.0 / 15.0
                    * cu
                    * (3.0 * cv - 30.0 * su + 90.0 * cu.powi(4) * su - 60.0 * cu.powi(6) * su
                        + 5.0 * cu * cv * su);
                let y = -1.0 / 15.0
                    * su
                    * (3.0 * cv - 3.0 * cu.powi(2) * cv - 48.0 * cu.powi(4) * cv
                        + 48.0 * cu.powi(6) * cv
                        - 60.0 * su
                        + 5.0 * cu * cv * su
                        - 5.0 * cu.powi(3) * cv * su
                        - 80.0 * cu.powi(5) * cv * su
                        + 80.0 * cu.powi(7) * cv * su);
                let z = 2.0 / 15.0 * (3.0 + 5.0 * cu * su) * sv;
                DVec3::new(x, y, z)
            }
            SurfaceFamily::Kuen => {
                let chv = v.cosh();
                let d = chv * chv + u * u;
                DVec3::new(
                    2.0 * chv * (u.cos() + u * u.sin()) / d,
                    v - 2.0 * v.sinh() * chv / d,
                    2.0 * chv * (-u * u.cos() + u.sin()) / d,
                )
            }
            SurfaceFamily::Minimal => DVec3::new(
                u - u.sin() * v.cosh(),
                4.0 * (0.5 * u).sin() * (0.5 * v).sinh(),
                1.0 - u.cos() * v.cosh(),
            ),
            SurfaceFamily::Pear => {
                let r = (u.powi(3) * (1.0 - u)).max(0.0).sqrt();
                DVec3::new(r * v.cos(), -u, r * v.sin())
            }
            SurfaceFamily::PluckerConoid => DVec3::new(u * v.cos(), (2.0 * v).sin(), u * v.sin()),
            SurfaceFamily::Seashell => {
                let e6 = (u / (6.0 * PI)).exp();
                let e3 = (u / (3.0 * PI)).exp();
                let c2 = (0.5 * v).cos().powi(2);
                DVec3::new(
                    2.0 * (1.0 - e6) * u.cos() * c2,
                    1.0 - e3 - v.sin() + e6 * v.sin(),
                    2.0 * (-1.0 + e6) * u.sin() * c2,
                )
            }
            SurfaceFamily::Steiner => {
                let s2v = (2.0 * v).sin();
                DVec3::new(
                    (2.0 * u).sin() * v.cos().powi(2),
                    u.sin() * s2v,
                    u.cos() * s2v,
                )
            }
            SurfaceFamily::Torus => {
                let (big_r, r) = (1.0, 0.4);
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let w = big_r + r * cv;
                DVec3::new(w * cu, r * sv, -w * su)
            }
            SurfaceFamily::Wellenkugel => {
                let ccu = u.cos().cos();
                DVec3::new(u * ccu * v.cos(), u * u.cos().sin(), u * ccu * v.sin())
            }
            // Height fields: u runs along z and v along x, so ∂u × ∂v points up.
            SurfaceFamily::Peaks => DVec3::new(v, peaks(v, u, t), u),
            SurfaceFamily::Poles => DVec3::new(v, poles(v, u, t), u),
            SurfaceFamily::Sinc => DVec3::new(v, sinc(v, u, t), u),
        }
    }

    /// Closed-form `(∂f/∂u, ∂f/∂v)` where the family has one.
    pub fn partials(self, u: f64, v: f64, _t: f64) -> Option<(DVec3, DVec3)> {
        match self {
            SurfaceFamily::Torus => {
                let (big_r, r) = (1.0, 0.4);
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                let w = big_r + r * cv;
                Some((
                    DVec3::new(-w * su, 0.0, -w * cu),
                    DVec3::new(-r * sv * cu, r * cv, r * sv * su),
                ))
            }
            SurfaceFamily::Enneper => Some((
                DVec3::new(1.0 - u * u + v * v, 2.0 * u, 2.0 * u * v),
                DVec3::new(2.0 * u * v, -2.0 * v, 1.0 - v * v + u * u),
            )),
            SurfaceFamily::BohemianDome => {
                let (su, cu) = u.sin_cos();
                let (sv, cv) = v.sin_cos();
                Some((
                    DVec3::new(-0.5 * su, 0.5 * cu, 0.0),
                    DVec3::new(0.0, -1.5 * sv, cv),
                ))
            }
            SurfaceFamily::PluckerConoid => {
                let (sv, cv) = v.sin_cos();
                Some((
                    DVec3::new(cv, 0.0, sv),
                    DVec3::new(-u * sv, 2.0 * (2.0 * v).cos(), u * cv),
                ))
            }
            _ => None,
        }
    }

    /// Unnormalized `∂f/∂u × ∂f/∂v`, analytic when available, else central differences.
    pub fn raw_normal(self, u: f64, v: f64, t: f64) -> DVec3 {
        let (du, dv) = self.partials(u, v, t).unwrap_or_else(|| {
            let h = FINITE_DIFFERENCE_STEP;
            let du = (self.position(u + h, v, t) - self.position(u - h, v, t)) / (2.0 * h);
            let dv = (self.position(u, v + h, t) - self.position(u, v - h, t)) / (2.0 * h);
            (du, dv)
        });
        du.cross(dv)
    }
}

impl FromStr for SurfaceFamily {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SurfaceFamily::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| PlotError::UnknownSurfaceFamily(s.to_string()))
    }
}

impl fmt::Display for SurfaceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn peaks(x: f64, z: f64, t: f64) -> f64 {
    let a = 3.0 * (1.0 - x).powi(2) * (-x * x - (z + 1.0).powi(2)).exp();
    let b = -10.0 * (x / 5.0 - x.powi(3) - z.powi(5)) * (-x * x - z * z).exp();
    let c = -1.0 / 3.0 * (-(x + 1.0).powi(2) - z * z).exp();
    0.4 * (a + b + c) * (0.6 + 0.4 * t.cos())
}

fn poles(x: f64, z: f64, t: f64) -> f64 {
    let (cz, cx) = t.sin_cos();
    1.0 / ((x - cx).powi(2) + (z - cz).powi(2) + 0.3)
        - 1.0 / ((x + cx).powi(2) + (z + cz).powi(2) + 0.3)
}

fn sinc(x: f64, z: f64, t: f64) -> f64 {
    let a = 1.01 + t.sin();
    let r = a * (x * x + z * z).sqrt() + 1e-6;
    6.0 * r.sin() / r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_parse_back() {
        for family in SurfaceFamily::ALL {
            assert_eq!(family.name().parse::<SurfaceFamily>(), Ok(family));
        }
        assert_eq!(
            "teapot".parse::<SurfaceFamily>(),
            Err(PlotError::UnknownSurfaceFamily("teapot".into()))
        );
    }

    #[test]
    fn periodic_directions_close_exactly() {
        for family in SurfaceFamily::ALL {
            let d = family.domain();
            for k in 0..=12 {
                let s = k as f64 / 12.0;
                if d.periodic_u {
                    let v = d.v.0 + (d.v.1 - d.v.0) * s;
                    let a = family.position(d.u.0, v, 0.3);
                    let b = family.position(d.u.1, v, 0.3);
                    assert!(a.distance(b) < 1e-9, "{family} does not close in u");
                }
                if d.periodic_v {
                    let u = d.u.0 + (d.u.1 - d.u.0) * s;
                    let a = family.position(u, d.v.0, 0.3);
                    let b = family.position(u, d.v.1, 0.3);
                    assert!(a.distance(b) < 1e-9, "{family} does not close in v");
                }
            }
        }
    }

    #[test]
    fn breather_crosses_the_axis_at_the_origin() {
        // a = 0.4: at u = 0, v = 0 the point sits on x = 0, y = -2/a
        let p = SurfaceFamily::Breather.position(0.0, 0.0, 0.0);
        assert!(p.is_finite());
        assert!(p.x.abs() < 1e-12);
        assert!((p.y + 5.0).abs() < 1e-9, "{p}");
    }

    #[test]
    fn klein_bottle_is_not_periodic_in_u() {
        let d = SurfaceFamily::KleinBottle.domain();
        assert!(!d.periodic_u);
        let a = SurfaceFamily::KleinBottle.position(d.u.0, 0.0, 0.0);
        let b = SurfaceFamily::KleinBottle.position(d.u.1, 0.0, 0.0);
        assert!(a.distance(b) > 0.1);
    }

    #[test]
    fn analytic_partials_agree_with_finite_differences() {
        let h = FINITE_DIFFERENCE_STEP;
        for family in [
            SurfaceFamily::Torus,
            SurfaceFamily::Enneper,
            SurfaceFamily::BohemianDome,
            SurfaceFamily::PluckerConoid,
        ] {
            let (u, v) = (0.7, 0.4);
            let (du, dv) = family.partials(u, v, 0.0).unwrap();
            let fd_u = (family.position(u + h, v, 0.0) - family.position(u - h, v, 0.0)) / (2.0 * h);
            let fd_v = (family.position(u, v + h, 0.0) - family.position(u, v - h, 0.0)) / (2.0 * h);
            assert!(du.distance(fd_u) < 1e-5, "{family} du");
            assert!(dv.distance(fd_v) < 1e-5, "{family} dv");
        }
    }

    #[test]
    fn torus_normal_points_away_from_the_core_ring() {
        let p = SurfaceFamily::Torus.position(0.0, 0.0, 0.0);
        let n = SurfaceFamily::Torus.raw_normal(0.0, 0.0, 0.0).normalize();
        assert!((p - DVec3::new(1.4, 0.0, 0.0)).length() < 1e-12);
        assert!(n.dot(DVec3::X) > 0.99);
    }

    #[test]
    fn height_fields_face_up() {
        for family in [SurfaceFamily::Peaks, SurfaceFamily::Poles, SurfaceFamily::Sinc] {
            assert!(family.is_animated());
            let n = family.raw_normal(0.3, -0.2, 1.0);
            assert!(n.y > 0.0, "{family}");
        }
    }

    #[test]
    fn animated_families_depend_on_time() {
        let a = SurfaceFamily::Sinc.position(0.5, 0.5, 0.0);
        let b = SurfaceFamily::Sinc.position(0.5, 0.5, 1.0);
        assert_ne!(a, b);
        let c = SurfaceFamily::Torus.position(0.5, 0.5, 0.0);
        let d = SurfaceFamily::Torus.position(0.5, 0.5, 1.0);
        assert_eq!(c, d);
    }
}
