//! Placeholder jar archives for mocked artifacts.
//!
//! Entries are stored uncompressed; clients only need a readable archive with
//! a manifest.

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const MANIFEST_DIRECTORY: &str = "META-INF/";
const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
const PLUGIN_DESCRIPTOR_PATH: &str = "META-INF/maven/plugin.xml";

const MANIFEST: &str = "Manifest-Version: 1.0\r\n\
                        Archiver-Version: 1.0\r\n\
                        Created-By: Maven Mock Repository\r\n\r\n";

fn archive_error(e: zip::result::ZipError) -> io::Error {
    io::Error::other(e)
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

struct JarWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl JarWriter {
    fn new(manifest: &[u8]) -> io::Result<Self> {
        let mut jar = Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        };
        jar.directory(MANIFEST_DIRECTORY)?;
        jar.file(MANIFEST_PATH, manifest)?;
        Ok(jar)
    }

    fn directory(&mut self, name: &str) -> io::Result<()> {
        self.zip
            .add_directory(name, options())
            .map_err(archive_error)
    }

    fn file(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        self.zip.start_file(name, options()).map_err(archive_error)?;
        self.zip.write_all(content)
    }

    fn finish(self) -> io::Result<Vec<u8>> {
        Ok(self.zip.finish().map_err(archive_error)?.into_inner())
    }
}

/// A jar holding nothing but its manifest.
pub fn empty_jar() -> io::Result<Vec<u8>> {
    JarWriter::new(MANIFEST.as_bytes())?.finish()
}

/// A jar with a minimal `META-INF/maven/plugin.xml` naming the plugin.
pub fn plugin_jar(group_id: &str, artifact_id: &str, version: &str) -> io::Result<Vec<u8>> {
    let descriptor = format!(
        "<plugin><groupId>{group_id}</groupId><artifactId>{artifact_id}</artifactId>\
         <version>{version}</version></plugin>"
    );
    let mut jar = JarWriter::new(MANIFEST.as_bytes())?;
    jar.directory("META-INF/maven/")?;
    jar.file(PLUGIN_DESCRIPTOR_PATH, descriptor.as_bytes())?;
    jar.finish()
}

/// Archive the contents of `directory`.
///
/// A `META-INF/MANIFEST.MF` inside the directory replaces the generated one.
pub fn directory_jar(directory: &Path) -> io::Result<Vec<u8>> {
    let manifest = match fs::read(directory.join(MANIFEST_PATH)) {
        Ok(manifest) => manifest,
        Err(e) if e.kind() == io::ErrorKind::NotFound => MANIFEST.as_bytes().to_vec(),
        Err(e) => return Err(e),
    };
    let mut jar = JarWriter::new(&manifest)?;

    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let Ok(relative) = entry.path().strip_prefix(directory) else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            let name = format!("{name}/");
            if name != MANIFEST_DIRECTORY {
                jar.directory(&name)?;
            }
        } else if name != MANIFEST_PATH {
            jar.file(&name, &fs::read(entry.path())?)?;
        }
    }
    jar.finish()
}
