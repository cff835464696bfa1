use clap::{Parser, ValueEnum};
use glam::Vec3;

use crate::error::Result;
use crate::math::{Axis, SurfaceSpec};
use crate::renderer::{InstanceLayout, MeshCapacity};
use crate::ui::state::SurfaceParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scene {
    /// One rotating surface.
    Single,
    /// A field of instanced copies sharing one mesh.
    Grid,
}

#[derive(Parser, Debug)]
#[command(name = "surfplot", about = "Interactive parametric surface plotter", version)]
pub struct Args {
    #[arg(long, value_enum, default_value_t = Scene::Single)]
    pub scene: Scene,

    /// Surface family, e.g. kleinBottle, torus, sinc.
    #[arg(long)]
    pub surface: Option<String>,

    /// Colormap name, e.g. jet, hsv, cool, or a solid color name.
    #[arg(long)]
    pub colormap: Option<String>,

    #[arg(long, default_value = "white")]
    pub wireframe_color: String,

    #[arg(long)]
    pub nu: Option<usize>,

    #[arg(long)]
    pub nv: Option<usize>,

    #[arg(long)]
    pub scale: Option<f32>,

    #[arg(long, default_value_t = 100)]
    pub instances_x: u32,

    #[arg(long, default_value_t = 100)]
    pub instances_z: u32,

    #[arg(long, default_value_t = 4, value_parser = parse_msaa)]
    pub msaa: u32,

    #[arg(long)]
    pub vsync: bool,

    /// Reserve buffers for an N x N grid so resolution can grow up to N at runtime.
    #[arg(long, default_value_t = 128)]
    pub capacity_grid: usize,
}

fn parse_msaa(s: &str) -> std::result::Result<u32, String> {
    match s {
        "1" => Ok(1),
        "4" => Ok(4),
        _ => Err(format!("MSAA sample count must be 1 or 4, got {s}")),
    }
}

pub struct ScenePreset {
    pub params: SurfaceParams,
    pub layout: InstanceLayout,
    pub eye: Vec3,
    /// Largest segment count either direction may reach without reallocating.
    pub max_grid: usize,
    pub capacity: MeshCapacity,
}

impl Args {
    pub fn preset(&self) -> Result<ScenePreset> {
        let (family, nu, nv, scale, colormap, layout, eye) = match self.scene {
            Scene::Single => (
                "kleinBottle",
                64,
                16,
                3.5,
                "jet",
                InstanceLayout::single(),
                Vec3::new(2.0, 2.0, 4.0),
            ),
            Scene::Grid => (
                "sinc",
                64,
                64,
                0.5,
                "jet",
                InstanceLayout::centred_grid(self.instances_x, self.instances_z, 2.0, 2.0),
                Vec3::new(3.0, 4.5, 5.2),
            ),
        };

        let spec = SurfaceSpec::from_names(
            self.surface.as_deref().unwrap_or(family),
            self.nu.unwrap_or(nu),
            self.nv.unwrap_or(nv),
            self.scale.unwrap_or(scale),
            self.colormap.as_deref().unwrap_or(colormap),
            &self.wireframe_color,
            Axis::Y,
        )?;

        let mut params = SurfaceParams::from_spec(&spec);
        if self.scene == Scene::Grid {
            params.rotation_speed = 0.9;
        }

        let grid = self.capacity_grid.max(spec.nu).max(spec.nv);
        Ok(ScenePreset {
            params,
            layout,
            eye,
            max_grid: grid,
            capacity: MeshCapacity::for_grid(grid, grid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use crate::math::{Colormap, SolidColor, SurfaceFamily};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("surfplot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn single_scene_defaults() {
        let preset = parse(&[]).preset().unwrap();
        assert_eq!(preset.params.family, SurfaceFamily::KleinBottle);
        assert_eq!((preset.params.nu, preset.params.nv), (64, 16));
        assert_eq!(preset.params.scale, 3.5);
        assert_eq!(preset.params.wireframe_color, SolidColor::White);
        assert_eq!(preset.layout.count(), 1);
        assert_eq!(preset.params.rotation_speed, 1.0);
        assert_eq!(preset.max_grid, 128);
        assert_eq!(preset.capacity, MeshCapacity::for_grid(128, 128));
    }

    #[test]
    fn grid_scene_uses_instances() {
        let args = parse(&["--scene", "grid", "--instances-x", "10", "--instances-z", "20"]);
        let preset = args.preset().unwrap();
        assert_eq!(preset.params.family, SurfaceFamily::Sinc);
        assert_eq!(preset.params.scale, 0.5);
        assert_eq!(preset.params.rotation_speed, 0.9);
        assert_eq!(preset.layout.count(), 200);
    }

    #[test]
    fn overrides_by_name() {
        let args = parse(&[
            "--surface",
            "torus",
            "--colormap",
            "hot",
            "--wireframe-color",
            "red",
            "--nu",
            "200",
            "--nv",
            "20",
        ]);
        let preset = args.preset().unwrap();
        assert_eq!(preset.params.family, SurfaceFamily::Torus);
        assert_eq!(preset.params.colormap, Colormap::Hot);
        assert_eq!(preset.params.wireframe_color, SolidColor::Red);
        assert_eq!(preset.capacity, MeshCapacity::for_grid(200, 200));
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = parse(&["--surface", "teapot"]).preset().err().unwrap();
        assert_eq!(err, PlotError::UnknownSurfaceFamily("teapot".into()));

        let err = parse(&["--colormap", "plasma"]).preset().err().unwrap();
        assert_eq!(err, PlotError::UnknownColormap("plasma".into()));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let err = parse(&["--nu", "0"]).preset().err().unwrap();
        assert!(matches!(err, PlotError::InvalidGridResolution { nu: 0, .. }));
    }

    #[test]
    fn msaa_accepts_only_supported_counts() {
        assert_eq!(parse(&["--msaa", "1"]).msaa, 1);
        assert!(Args::try_parse_from(["surfplot", "--msaa", "8"]).is_err());
    }
}
