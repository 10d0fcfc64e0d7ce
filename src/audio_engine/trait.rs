/// Interface du moteur audio vue par l'hôte (callback temps réel, rendu offline).
///
/// `process_block` est appelé depuis le thread audio : pas d'allocation, pas
/// de verrou bloquant, pas d'erreur remontée.
pub trait AudioEngine {
    /// Dimensionne les tampons pour des blocs jusqu'à `max_block_size`.
    /// À appeler hors du thread audio.
    fn prepare(&mut self, _max_block_size: usize) {}

    fn set_sample_rate(&mut self, sample_rate: f32);
    fn sample_rate(&self) -> f32;

    /// Traite un bloc mono ; les sorties micro sont ensuite lisibles via
    /// `microphone_output`.
    fn process_block(&mut self, input: &[f32]);

    /// Sortie du dernier bloc pour le micro `mic`, `None` si hors limites.
    fn microphone_output(&self, mic: usize) -> Option<&[f32]>;

    fn set_bypass(&mut self, bypass: bool);
    fn is_bypassed(&self) -> bool;

    /// Latence ajoutée, en échantillons.
    fn latency_samples(&self) -> usize;
}
