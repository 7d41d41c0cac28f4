use crate::engine::KeyValue;

/// Map de wordcount: emite ("palabra", "1") por cada palabra del contenido.
/// Normaliza igual que siempre: solo alfanumérico y '_', en minúscula.
pub fn map(_name: &str, content: &str) -> Vec<KeyValue> {
    let mut pairs = Vec::new();

    for raw in content.split_whitespace() {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase();

        if !cleaned.is_empty() {
            pairs.push(KeyValue {
                key: cleaned,
                value: "1".to_string(),
            });
        }
    }

    pairs
}

/// Reduce de wordcount: la cantidad de valores es el conteo de la palabra.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}
