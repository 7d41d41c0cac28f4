use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map::DefaultHasher,
    fs::{self, File},
    hash::{Hash, Hasher},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

/// Par clave/valor que emiten las funciones de map y consumen las de reduce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Función de map provista por el usuario: (nombre, contenido) -> pares.
pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;

/// Función de reduce provista por el usuario: (clave, valores) -> agregado.
pub type ReduceFn = fn(&str, &[String]) -> String;

/// Partición reduce a la que va una clave: hash estable módulo R.
pub fn partition_for_key(key: &str, n_reduce: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % n_reduce
}

fn ensure_dir(dir: &str) -> io::Result<()> {
    if !dir.is_empty() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Ejecuta una tarea map: lee cada archivo de entrada, aplica map_fn y
/// reparte los pares en R buckets por hash de la clave.
///
/// Cada bucket no vacío se escribe como JSONL en `dir/mr-<task_id>-<r>`.
/// Devuelve un vector de R entradas alineadas por partición, con "" en las
/// particiones que no recibieron ninguna clave.
pub fn run_map_task(
    map_fn: MapFn,
    task_id: usize,
    inputs: &[String],
    n_reduce: usize,
    dir: &str,
) -> io::Result<Vec<String>> {
    ensure_dir(dir)?;

    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce];

    for input_path in inputs {
        let content = fs::read_to_string(input_path)?;
        for kv in map_fn(input_path, &content) {
            let r = partition_for_key(&kv.key, n_reduce);
            buckets[r].push(kv);
        }
    }

    let mut output = vec![String::new(); n_reduce];

    for (r, bucket) in buckets.into_iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }

        let path = Path::new(dir)
            .join(format!("mr-{}-{}", task_id, r))
            .to_string_lossy()
            .to_string();

        let mut writer = BufWriter::new(File::create(&path)?);
        for kv in &bucket {
            serde_json::to_writer(&mut writer, kv)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        output[r] = path;
    }

    Ok(output)
}

/// Ejecuta una tarea reduce: junta todas las particiones intermedias que
/// aportaron los maps, ordena por clave, agrupa claves iguales consecutivas
/// y aplica reduce_fn por grupo.
///
/// El resultado se escribe como "clave valor" por línea. Primero a un archivo
/// temporal y después rename a `dir/mr-out-<task_id>`, para que nadie vea un
/// archivo final a medio escribir. Devuelve la ruta final.
pub fn run_reduce_task(
    reduce_fn: ReduceFn,
    task_id: usize,
    inputs: &[String],
    dir: &str,
) -> io::Result<String> {
    ensure_dir(dir)?;

    let mut intermediate: Vec<KeyValue> = Vec::new();

    for input_path in inputs {
        let reader = BufReader::new(File::open(input_path)?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let kv: KeyValue = serde_json::from_str(&line)?;
            intermediate.push(kv);
        }
    }

    intermediate.sort_by(|a, b| a.key.cmp(&b.key));

    let tmp_path = Path::new(dir)
        .join(format!("mr-tmp-{}-{}", uuid::Uuid::new_v4(), task_id))
        .to_string_lossy()
        .to_string();
    let out_path = Path::new(dir)
        .join(format!("mr-out-{}", task_id))
        .to_string_lossy()
        .to_string();

    let mut writer = BufWriter::new(File::create(&tmp_path)?);

    let mut i = 0;
    while i < intermediate.len() {
        let mut j = i + 1;
        while j < intermediate.len() && intermediate[j].key == intermediate[i].key {
            j += 1;
        }

        let values: Vec<String> = intermediate[i..j].iter().map(|kv| kv.value.clone()).collect();
        let aggregated = reduce_fn(&intermediate[i].key, &values);
        writeln!(writer, "{} {}", intermediate[i].key, aggregated)?;

        i = j;
    }

    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, &out_path)?;

    Ok(out_path)
}
