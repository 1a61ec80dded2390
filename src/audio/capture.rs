use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::Producer;
use tracing::{error, info};

/// Rates webrtc VAD accepts, most preferred first.
const VAD_RATES: [u32; 4] = [16000, 32000, 48000, 8000];

/// Live microphone stream feeding mono f32 samples into a ring buffer.
///
/// The stream is not `Send`; keep this value alive on the thread that built it
/// (the binary holds it in `main`) and hand the consumer half to the listener.
pub struct AudioCapture {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl AudioCapture {
    pub fn new<P>(mut producer: P) -> Result<Self, anyhow::Error>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No input device available"))?;

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        let mut selected = None;
        'rates: for &rate in &VAD_RATES {
            for range in device.supported_input_configs()? {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    selected = Some(range.with_sample_rate(cpal::SampleRate(rate)));
                    break 'rates;
                }
            }
        }

        let config = match selected {
            Some(c) => c,
            None => {
                let def = device.default_input_config()?;
                if !VAD_RATES.contains(&def.sample_rate().0) {
                    return Err(anyhow::anyhow!(
                        "Unsupported sample rate: {}. VAD requires 8k, 16k, 32k, or 48k.",
                        def.sample_rate().0
                    ));
                }
                def
            }
        };

        let sample_rate = config.sample_rate().0;
        let channels = config.channels().max(1) as usize;
        info!("Audio Config Selected: Rate={}Hz, Channels={}", sample_rate, channels);

        let err_fn = |err| error!("an error occurred on stream: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| write_mono(data.iter().copied(), channels, &mut producer),
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| {
                    write_mono(
                        data.iter().map(|&s| s as f32 / i16::MAX as f32),
                        channels,
                        &mut producer,
                    )
                },
                err_fn,
                None,
            )?,
            _ => return Err(anyhow::anyhow!("Unsupported sample format")),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

/// Averages interleaved frames down to mono. Drops samples when the buffer is full.
fn write_mono<I, P>(samples: I, channels: usize, producer: &mut P)
where
    I: Iterator<Item = f32>,
    P: Producer<Item = f32>,
{
    let mut acc = 0.0;
    let mut n = 0;
    for sample in samples {
        acc += sample;
        n += 1;
        if n == channels {
            let _ = producer.try_push(acc / channels as f32);
            acc = 0.0;
            n = 0;
        }
    }
}
