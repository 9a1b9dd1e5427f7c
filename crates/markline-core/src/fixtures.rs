use crate::model::AudioSource;

#[must_use]
pub fn click_track(
    sample_rate: u32,
    seconds: f64,
    hit_times: &[f64],
    amplitude: f32,
) -> AudioSource {
    let frames = (seconds.max(0.0) * f64::from(sample_rate)).round() as usize;
    let mut samples = vec![0.0_f32; frames];
    for &time in hit_times {
        let index = (time * f64::from(sample_rate)).round() as usize;
        if let Some(sample) = samples.get_mut(index) {
            *sample = amplitude;
        }
    }
    AudioSource::mono(sample_rate, samples)
}

#[must_use]
pub fn tone(
    sample_rate: u32,
    seconds: f64,
    frequency: f32,
    amplitude: f32,
    channels: usize,
) -> AudioSource {
    let frames = (seconds.max(0.0) * f64::from(sample_rate)).round() as usize;
    let signal: Vec<f32> = (0..frames)
        .map(|frame| {
            let phase = frame as f32 / sample_rate as f32 * frequency * std::f32::consts::TAU;
            phase.sin() * amplitude
        })
        .collect();
    AudioSource::new(sample_rate, vec![signal; channels.max(1)])
}

#[must_use]
pub fn demo_source() -> AudioSource {
    click_track(8_000, 4.0, &[0.0, 0.5, 0.6, 1.25, 2.0, 2.1, 3.5], 0.9)
}
