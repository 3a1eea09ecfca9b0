use crate::shader::ShadingModel;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{Read, Seek};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const MANIFEST: &str = "manifest.toml";
const SPIRV_MAGIC: u32 = 0x0723_0203;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader archive has no manifest.toml")]
    MissingManifest,
    #[error("shader manifest has no entry for {0}")]
    MissingProgram(&'static str),
    #[error("shader manifest names unknown shading model '{0}'")]
    UnknownModel(String),
    #[error("module '{0}' is not in the shader archive")]
    MissingModule(String),
    #[error("{0} is not a SPIR-V module")]
    NotSpirV(String),
    #[error("cannot read {name} from the shader archive: {source}")]
    Read { name: String, source: std::io::Error },
    #[error("invalid shader manifest: {0}")]
    Manifest(#[from] toml::de::Error),
    #[error("shader archive: {0}")]
    Zip(#[from] ZipError),
}

/// One `[model]` table of the manifest.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ProgramEntry {
    pub vertex: String,
    pub fragment: String,
    #[serde(default = "depth_on")]
    pub depth_test: bool,
}

fn depth_on() -> bool {
    true
}

pub struct Stage<'a> {
    pub name: &'a str,
    pub code: &'a [u8],
}

pub struct Program<'a> {
    pub vertex: Stage<'a>,
    pub fragment: Stage<'a>,
    pub depth_test: bool,
}

/// SPIR-V stages for every shading model, as packed by `build.rs`.
#[derive(Debug)]
pub struct ShaderArchive {
    modules: HashMap<String, Vec<u8>>,
    programs: HashMap<ShadingModel, ProgramEntry>,
}

impl ShaderArchive {
    pub fn from_zip(mut zip: ZipArchive<impl Read + Seek>) -> Result<Self, ShaderError> {
        let mut modules = HashMap::new();
        let mut manifest = None;

        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            let path = file.name().to_owned();

            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|source| ShaderError::Read { name: path.clone(), source })?;

            match path.rsplit_once('.') {
                _ if path == MANIFEST => manifest = Some(content),
                Some((stem, "spv")) => {
                    check_spirv(stem, &content)?;
                    debug!("loaded shader module {stem} ({} bytes)", content.len());
                    modules.insert(stem.to_owned(), content);
                }
                _ => warn!("ignoring {path} in shader archive"),
            }
        }

        let manifest = manifest.ok_or(ShaderError::MissingManifest)?;
        let programs = parse_manifest(&String::from_utf8_lossy(&manifest))?;

        for entry in programs.values() {
            for module in [&entry.vertex, &entry.fragment] {
                if !modules.contains_key(module) {
                    return Err(ShaderError::MissingModule(module.clone()));
                }
            }
        }

        Ok(Self { modules, programs })
    }

    pub fn program(&self, model: ShadingModel) -> Result<Program<'_>, ShaderError> {
        let entry = self
            .programs
            .get(&model)
            .ok_or(ShaderError::MissingProgram(model.pipeline_name()))?;

        Ok(Program {
            vertex: self.stage(&entry.vertex)?,
            fragment: self.stage(&entry.fragment)?,
            depth_test: entry.depth_test,
        })
    }

    fn stage<'a>(&'a self, name: &'a str) -> Result<Stage<'a>, ShaderError> {
        let code = self
            .modules
            .get(name)
            .ok_or_else(|| ShaderError::MissingModule(name.to_owned()))?;

        Ok(Stage { name, code })
    }
}

/// Every shading model needs exactly one table, keyed by its pipeline name.
pub fn parse_manifest(text: &str) -> Result<HashMap<ShadingModel, ProgramEntry>, ShaderError> {
    let tables: HashMap<String, ProgramEntry> = toml::from_str(text)?;

    let mut programs = HashMap::new();
    for (name, entry) in tables {
        let model = ShadingModel::from_name(&name).ok_or(ShaderError::UnknownModel(name))?;
        programs.insert(model, entry);
    }

    if let Some(missing) = ShadingModel::ALL.into_iter().find(|m| !programs.contains_key(m)) {
        return Err(ShaderError::MissingProgram(missing.pipeline_name()));
    }

    Ok(programs)
}

fn check_spirv(name: &str, code: &[u8]) -> Result<(), ShaderError> {
    match code {
        [a, b, c, d, ..] if code.len() % 4 == 0 && u32::from_le_bytes([*a, *b, *c, *d]) == SPIRV_MAGIC => Ok(()),
        _ => Err(ShaderError::NotSpirV(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    const MAGIC: [u8; 4] = [0x03, 0x02, 0x23, 0x07];

    const ALL_MODELS: &str = r#"
        [phong]
        vertex = "phong_vert"
        fragment = "phong_frag"

        [gouraud]
        vertex = "gouraud_vert"
        fragment = "gouraud_frag"

        [unlit]
        vertex = "unlit_vert"
        fragment = "unlit_frag"
        depth_test = false
    "#;

    const MODULES: [&str; 6] = [
        "phong_vert.spv",
        "phong_frag.spv",
        "gouraud_vert.spv",
        "gouraud_frag.spv",
        "unlit_vert.spv",
        "unlit_frag.spv",
    ];

    fn archive(files: &[(&str, &[u8])]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }

        let cursor = zip.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    fn complete(skip: &str) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut files = vec![(MANIFEST, ALL_MODELS.as_bytes())];
        files.extend(MODULES.iter().filter(|m| **m != skip).map(|m| (*m, &MAGIC[..])));
        archive(&files)
    }

    #[test]
    fn every_model_gets_its_stages() {
        let shaders = ShaderArchive::from_zip(complete("")).unwrap();

        let gouraud = shaders.program(ShadingModel::Gouraud).unwrap();
        assert_eq!(gouraud.vertex.name, "gouraud_vert");
        assert_eq!(gouraud.fragment.name, "gouraud_frag");
        assert_eq!(gouraud.fragment.code, &MAGIC);
        assert!(gouraud.depth_test);

        assert!(!shaders.program(ShadingModel::Unlit).unwrap().depth_test);
    }

    #[test]
    fn missing_manifest_is_reported() {
        let zip = archive(&[("phong_vert.spv", &MAGIC[..])]);

        assert!(matches!(ShaderArchive::from_zip(zip), Err(ShaderError::MissingManifest)));
    }

    #[test]
    fn referenced_module_must_exist() {
        match ShaderArchive::from_zip(complete("unlit_frag.spv")) {
            Err(ShaderError::MissingModule(name)) => assert_eq!(name, "unlit_frag"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn modules_need_the_spirv_magic() {
        let mut files = vec![(MANIFEST, ALL_MODELS.as_bytes())];
        files.extend(MODULES.iter().map(|m| (*m, &MAGIC[..])));
        files[1] = ("phong_vert.spv", &b"void main() {}"[..]);

        match ShaderArchive::from_zip(archive(&files)) {
            Err(ShaderError::NotSpirV(name)) => assert_eq!(name, "phong_vert"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn manifest_must_cover_every_model() {
        let partial = "[phong]\nvertex = \"a\"\nfragment = \"b\"";

        assert!(matches!(
            parse_manifest(partial),
            Err(ShaderError::MissingProgram("gouraud" | "unlit"))
        ));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let text = format!("{ALL_MODELS}\n[pbr]\nvertex = \"a\"\nfragment = \"b\"");

        match parse_manifest(&text) {
            Err(ShaderError::UnknownModel(name)) => assert_eq!(name, "pbr"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        assert!(matches!(parse_manifest("[phong"), Err(ShaderError::Manifest(_))));
    }
}
