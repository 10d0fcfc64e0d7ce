// =========================
// Circular Sample Buffer
// =========================

use log::warn;

/// Capacité par défaut (1 s à 48 kHz).
pub const DEFAULT_CAPACITY: usize = 48_000;

/// Tampon circulaire mono à capacité fixe.
///
/// Quand l'écriture rattrape la lecture, les échantillons non lus les plus
/// anciens sont écrasés.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    data: Vec<f32>,
    write_pos: usize,
    read_pos: usize,
    available: usize,
}

impl Default for CircularBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_pos: 0,
            read_pos: 0,
            available: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Échantillons écrits et pas encore lus.
    pub fn available(&self) -> usize {
        self.available
    }

    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.read_pos = 0;
        self.available = 0;
    }

    pub fn write(&mut self, samples: &[f32]) {
        let capacity = self.capacity();
        let samples = if samples.len() > capacity {
            warn!(
                "CircularBuffer write of {} samples exceeds capacity {}, keeping the newest",
                samples.len(),
                capacity
            );
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let first = (capacity - self.write_pos).min(samples.len());
        self.data[self.write_pos..self.write_pos + first].copy_from_slice(&samples[..first]);
        let rest = samples.len() - first;
        self.data[..rest].copy_from_slice(&samples[first..]);
        self.write_pos = (self.write_pos + samples.len()) % capacity;

        self.available += samples.len();
        if self.available > capacity {
            // Le lecteur a été dépassé : il repart du plus ancien échantillon restant
            self.available = capacity;
            self.read_pos = self.write_pos;
        }
    }

    /// Lit au plus `out.len()` échantillons, retourne le nombre lu.
    pub fn read(&mut self, out: &mut [f32]) -> usize {
        let capacity = self.capacity();
        let n = out.len().min(self.available);

        let first = (capacity - self.read_pos).min(n);
        out[..first].copy_from_slice(&self.data[self.read_pos..self.read_pos + first]);
        out[first..n].copy_from_slice(&self.data[..n - first]);

        self.read_pos = (self.read_pos + n) % capacity;
        self.available -= n;
        n
    }
}
