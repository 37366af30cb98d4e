// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runs a headless frame loop against the host device and reports pool statistics.

use anyhow::{Context, Result};
use clap::Parser;
use pallas_core::math::{Mat4, Vec3, Vec4};
use pallas_core::renderer::BindlessHandle;
use pallas_data::{
    param_schema, ConstantBufferPool, ParameterSet, PoolSettings, SchemaBuilder, ShaderParameters,
};
use pallas_infra::HostGraphicsDevice;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about = "Drive the constant buffer pool through a simulated frame loop")]
struct Args {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Draw calls per frame.
    #[arg(long, default_value_t = 64)]
    draws: u32,

    /// Object sets kept alive into the next frame.
    #[arg(long, default_value_t = 0)]
    carry: u32,

    /// RON file with pool settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device memory budget in bytes.
    #[arg(long)]
    budget: Option<u64>,

    /// Write the final pool statistics to this file as RON.
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

struct ObjectParams {
    world: Mat4,
    tint: Vec4,
    albedo: BindlessHandle,
    roughness: f32,
    selected: bool,
}

impl ShaderParameters for ObjectParams {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        param_schema!(
            schema,
            ObjectParams { world, tint, albedo, roughness, selected }
        );
    }
}

struct LightParams {
    direction: Vec3,
    intensity: f32,
    color: Vec3,
    cascade_count: i32,
}

impl ShaderParameters for LightParams {
    fn declare(schema: &mut SchemaBuilder<Self>) {
        param_schema!(
            schema,
            LightParams { direction, intensity, color, cascade_count }
        );
    }
}

fn object(frame: u32, draw: u32) -> ObjectParams {
    let angle = (frame as f32 * 0.01) + draw as f32;
    ObjectParams {
        world: Mat4::from_translation(Vec3::new(angle.cos(), 0.0, angle.sin())),
        tint: Vec4::new(1.0, 1.0, 1.0, 1.0),
        albedo: BindlessHandle(draw % 16),
        roughness: 0.5,
        selected: draw == 0,
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => PoolSettings::load(path)
            .with_context(|| format!("loading pool settings from {}", path.display()))?,
        None => PoolSettings::default(),
    };

    let device = Arc::new(match args.budget {
        Some(bytes) => HostGraphicsDevice::with_budget(bytes),
        None => HostGraphicsDevice::new(),
    });
    let pool = ConstantBufferPool::new(device.clone(), &settings);

    let object_layout = pool.layout::<ObjectParams>();
    let light_layout = pool.layout::<LightParams>();
    log::info!(
        "ObjectParams packs into {} bytes, LightParams into {} bytes",
        object_layout.size(),
        light_layout.size()
    );
    for slot in object_layout.slots() {
        log::debug!(
            "  {:<12} {:<8} cpu +{:<3} gpu +{}",
            slot.name,
            slot.ty,
            slot.cpu_offset,
            slot.gpu_offset
        );
    }

    let mut carried: Vec<ParameterSet<ObjectParams>> = Vec::new();
    for frame in 0..args.frames {
        let light = ParameterSet::with_values(
            &pool,
            "Sun",
            &LightParams {
                direction: Vec3::new(0.3, -1.0, 0.2).normalize(),
                intensity: 1.0 + (frame % 60) as f32 / 60.0,
                color: Vec3::ONE,
                cascade_count: 4,
            },
        )
        .context("leasing light parameters")?;

        for draw in 0..args.draws {
            let set = ParameterSet::with_values(&pool, "Object", &object(frame, draw))
                .with_context(|| format!("leasing object parameters for draw {draw}"))?;
            log::trace!("frame {frame}: draw {draw} bound to {}", set.buffer());
            if draw < args.carry {
                carried.push(set);
            }
        }
        drop(light);

        // The previous frame's carried sets must be released before their slot comes back.
        let previous = carried.len().saturating_sub(args.carry.min(args.draws) as usize);
        carried.drain(..previous);
        pool.advance_slot();
    }
    drop(carried);

    let stats = pool.stats();
    pool.shutdown();

    println!("frames: {}, draws per frame: {}", args.frames, args.draws);
    println!("pool: {stats}");
    if let Some(path) = &args.stats_out {
        let report = stats.to_ron_string().context("serializing pool statistics")?;
        std::fs::write(path, report)
            .with_context(|| format!("writing pool statistics to {}", path.display()))?;
        log::info!("Pool statistics written to {}", path.display());
    }
    println!(
        "device: {} buffers created, peak {} bytes",
        device.buffers_created(),
        device.peak_allocated_bytes()
    );
    Ok(())
}
