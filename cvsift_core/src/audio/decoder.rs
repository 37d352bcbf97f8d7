use anyhow::{anyhow, Context, Result};
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use rubato::{Fft, FixedSync, Resampler};
use audioadapter_buffers::direct::InterleavedSlice;

/// Mono PCM in [-1.0, 1.0] together with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoPcm {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode an audio file (mp3, wav, flac, ogg) and downmix it to mono.
pub fn decode_mono<P: AsRef<Path>>(path: P) -> Result<MonoPcm> {
    let path = path.as_ref();

    // -------------------------
    // 1) Decode with Symphonia
    // -------------------------
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("unsupported format or failed to probe container")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("no supported audio tracks found"))?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create decoder for selected track")?;

    let mut interleaved_f32: Vec<f32> = Vec::new();

    // Codec params may omit these; the first decoded buffer fills them in.
    let mut input_sample_rate: Option<u32> = track.codec_params.sample_rate;
    let mut input_channels: Option<usize> = track.codec_params.channels.map(|c| c.count());

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("decoder reset required (chained streams)"));
            }
            Err(SymphoniaError::IoError(_)) => break, // end of file
            Err(e) => return Err(e).context("error reading next packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::IoError(_)) => continue,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::ResetRequired) => {
                return Err(anyhow!("decoder reset required mid-stream"));
            }
            Err(e) => return Err(e).context("unrecoverable decode error"),
        };

        input_sample_rate.get_or_insert(decoded.spec().rate);
        input_channels.get_or_insert(decoded.spec().channels.count());

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sbuf.copy_interleaved_ref(decoded);

        interleaved_f32.extend_from_slice(sbuf.samples());
    }

    let sample_rate =
        input_sample_rate.ok_or_else(|| anyhow!("could not determine input sample rate"))?;
    let ch_in = input_channels.ok_or_else(|| anyhow!("could not determine channel count"))?;

    // -------------------------
    // 2) Downmix to mono
    // -------------------------
    let samples: Vec<f32> = if ch_in <= 1 {
        interleaved_f32
    } else {
        interleaved_f32
            .chunks_exact(ch_in)
            .map(|frame| frame.iter().sum::<f32>() / ch_in as f32)
            .collect()
    };

    Ok(MonoPcm {
        samples,
        sample_rate,
    })
}

/// Resample mono PCM to `sr_out` with rubato's FFT resampler.
pub fn resample_mono(pcm: &MonoPcm, sr_out: u32) -> Result<Vec<f32>> {
    let sr_in = pcm.sample_rate;
    if sr_in == sr_out || pcm.samples.is_empty() {
        return Ok(pcm.samples.clone());
    }

    let chunk_size: usize = 1024;
    let sub_chunks: usize = 1;

    let mut resampler = Fft::<f32>::new(
        sr_in as usize,
        sr_out as usize,
        chunk_size,
        sub_chunks,
        1,                // mono
        FixedSync::Input, // fixed input chunking, output varies
    )
    .context("failed to construct FFT resampler")?;

    let input_len_frames = pcm.samples.len();
    let out_len_frames = resampler.process_all_needed_output_len(input_len_frames);

    let mut out = vec![0.0f32; out_len_frames];

    let input_adapter = InterleavedSlice::new(&pcm.samples, 1, input_len_frames)
        .context("bad input adapter")?;

    let mut output_adapter =
        InterleavedSlice::new_mut(&mut out, 1, out_len_frames).context("bad output adapter")?;

    let (_frames_read, frames_written) = resampler.process_all_into_buffer(
        &input_adapter,
        &mut output_adapter,
        input_len_frames,
        None,
    )?;

    out.truncate(frames_written);
    Ok(out)
}

/// Decode a file straight to mono PCM at `sample_rate`.
pub fn decode_resampled<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Vec<f32>> {
    let pcm = decode_mono(path)?;
    resample_mono(&pcm, sample_rate)
}
