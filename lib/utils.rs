//! Output helpers for the driver binaries.

/// Create a directory and all of its parents.
///
/// *Panics* on failure.
#[macro_export]
macro_rules! mkdir {
    ($path:expr) => {
        std::fs::create_dir_all(&$path)
            .unwrap_or_else(|e| {
                panic!("couldn't create directory {:?}: {}", $path, e)
            })
    }
}

/// Write named arrays to a `.npz` archive.
///
/// *Panics* on failure.
///
/// # Example
/// ```ignore
/// write_npz!(
///     outdir.join("data.npz"),
///     arrays: {
///         "time" => &time,
///         "pops" => &pops,
///     }
/// );
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $path:expr,
        arrays: { $( $name:expr => $arr:expr ),+ $(,)? } $(,)?
    ) => {
        {
            let mut npz
                = $crate::ndarray_npy::NpzWriter::new(
                    std::fs::File::create(&$path)
                        .unwrap_or_else(|e| {
                            panic!("couldn't create {:?}: {}", $path, e)
                        })
                );
            $(
                npz.add_array($name, $arr)
                    .unwrap_or_else(|e| {
                        panic!("couldn't write array {:?}: {}", $name, e)
                    });
            )+
            npz.finish().expect("couldn't finalize npz archive");
        }
    }
}
