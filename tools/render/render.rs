use anyhow::{anyhow, bail, Context, Result};
use gregchild::dsp::{CompressorMode, Processor, StereoMode, StereoTopology};
use gregchild::presets::{PresetManager, DEFAULT_PRESET};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

const BLOCK_SIZE: usize = 512;

const USAGE: &str = "usage: gregchild_render <input.wav> <output.wav> [--preset NAME] \
[--sidechain FILE.wav] [--mode varimu|opto|jfet|vca] [--stereo link|dual|ms|ms-linked]";

struct Args {
    input: PathBuf,
    output: PathBuf,
    preset: String,
    sidechain: Option<PathBuf>,
    mode: Option<CompressorMode>,
    topology: Option<StereoTopology>,
}

fn parse_mode(name: &str) -> Result<CompressorMode> {
    match name.to_ascii_lowercase().as_str() {
        "varimu" | "vari-mu" => Ok(CompressorMode::VariMu),
        "opto" => Ok(CompressorMode::Opto),
        "jfet" => Ok(CompressorMode::Jfet),
        "vca" => Ok(CompressorMode::Vca),
        other => bail!("unknown mode '{}'", other),
    }
}

fn parse_topology(name: &str) -> Result<StereoTopology> {
    match name.to_ascii_lowercase().as_str() {
        "link" => Ok(StereoTopology::new(StereoMode::StereoLink, false)),
        "dual" => Ok(StereoTopology::new(StereoMode::DualMono, false)),
        "ms" => Ok(StereoTopology::new(StereoMode::MidSide, false)),
        "ms-linked" => Ok(StereoTopology::new(StereoMode::MidSide, true)),
        other => bail!("unknown stereo topology '{}'", other),
    }
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let input = args.next().map(PathBuf::from).ok_or_else(|| anyhow!(USAGE))?;
    let output = args.next().map(PathBuf::from).ok_or_else(|| anyhow!(USAGE))?;
    let mut parsed = Args {
        input,
        output,
        preset: DEFAULT_PRESET.to_string(),
        sidechain: None,
        mode: None,
        topology: None,
    };

    while let Some(flag) = args.next() {
        let value = args
            .next()
            .with_context(|| format!("missing value for '{}'", flag))?;
        match flag.as_str() {
            "--preset" => parsed.preset = value,
            "--sidechain" => parsed.sidechain = Some(PathBuf::from(value)),
            "--mode" => parsed.mode = Some(parse_mode(&value)?),
            "--stereo" => parsed.topology = Some(parse_topology(&value)?),
            other => bail!("unknown flag '{}'\n{}", other, USAGE),
        }
    }
    Ok(parsed)
}

/// Read a WAV into deinterleaved left/right channels. Mono files are
/// duplicated onto both channels.
fn read_stereo(path: &Path) -> Result<(u32, Vec<f32>, Vec<f32>)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open WAV '{}'", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }
    Ok((spec.sample_rate, left, right))
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let presets = PresetManager::new();
    let mut params = *presets.get(&args.preset).with_context(|| {
        let names: Vec<&str> = presets.names().collect();
        format!("unknown preset '{}' (available: {})", args.preset, names.join(", "))
    })?;
    if let Some(mode) = args.mode {
        params.mode = mode;
    }
    if let Some(topology) = args.topology {
        params.topology = topology;
    }

    let (sample_rate, mut left, mut right) = read_stereo(&args.input)?;
    let sidechain = match &args.sidechain {
        Some(path) => {
            let (sc_rate, mut sc_l, mut sc_r) = read_stereo(path)?;
            if sc_rate != sample_rate {
                bail!(
                    "sidechain sample rate {} does not match input {}",
                    sc_rate,
                    sample_rate
                );
            }
            // Pad or truncate so every block lines up with the main input.
            sc_l.resize(left.len(), 0.0);
            sc_r.resize(left.len(), 0.0);
            Some((sc_l, sc_r))
        }
        None => None,
    };

    let mut processor = Processor::new(sample_rate as f32)?;
    processor
        .set_parameters(params)
        .with_context(|| format!("preset '{}' rejected", args.preset))?;

    let mut peak_gr = 0.0f32;
    let mut gr_sum = 0.0f64;
    let mut blocks = 0usize;
    for start in (0..left.len()).step_by(BLOCK_SIZE) {
        let end = (start + BLOCK_SIZE).min(left.len());
        let sc = sidechain
            .as_ref()
            .map(|(sc_l, sc_r)| (&sc_l[start..end], &sc_r[start..end]));
        let readings = processor.process_block(&mut left[start..end], &mut right[start..end], sc)?;
        peak_gr = peak_gr.min(readings.gain_reduction_db);
        gr_sum += readings.gain_reduction_db as f64;
        blocks += 1;
    }

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create WAV '{}'", args.output.display()))?;
    for (l, r) in left.iter().zip(right.iter()) {
        writer.write_sample(*l)?;
        writer.write_sample(*r)?;
    }
    writer.finalize()?;

    let avg_gr = if blocks > 0 { gr_sum / blocks as f64 } else { 0.0 };
    println!("Render summary for '{}':", args.input.display());
    println!("  preset           : {}", args.preset);
    println!("  mode             : {}", params.mode.name());
    println!("  frames processed : {}", left.len());
    println!("  peak GR          : {:.2} dB", peak_gr);
    println!("  average GR       : {:.2} dB", avg_gr);
    Ok(())
}
