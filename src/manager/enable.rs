//! Unit file enablement
//!
//! systemd creates and removes the symlinks itself; these calls only forward
//! the request and report the changes it made. `runtime` targets /run instead
//! of /etc, `force` replaces symlinks owned by other units.

use super::listing::{UnitFileChange, UnitFileEntry};
use super::Manager;
use crate::error::Result;

type RawChanges = Vec<(String, String, String)>;

fn changes(raw: RawChanges) -> Vec<UnitFileChange> {
    raw.into_iter().map(UnitFileChange::from).collect()
}

impl Manager {
    /// Enable unit files. Returns whether they carry [Install] info, and the changes made.
    pub async fn enable_unit_files(
        &self,
        files: &[&str],
        runtime: bool,
        force: bool,
    ) -> Result<(bool, Vec<UnitFileChange>)> {
        let (carries_install_info, raw): (bool, RawChanges) =
            self.call("EnableUnitFiles", &(files, runtime, force)).await?;
        log::debug!("EnableUnitFiles {:?}: {} changes", files, raw.len());
        Ok((carries_install_info, changes(raw)))
    }

    pub async fn disable_unit_files(&self, files: &[&str], runtime: bool) -> Result<Vec<UnitFileChange>> {
        let raw: RawChanges = self.call("DisableUnitFiles", &(files, runtime)).await?;
        log::debug!("DisableUnitFiles {:?}: {} changes", files, raw.len());
        Ok(changes(raw))
    }

    /// Disable then enable, returning the symlinks to their defaults
    pub async fn reenable_unit_files(
        &self,
        files: &[&str],
        runtime: bool,
        force: bool,
    ) -> Result<(bool, Vec<UnitFileChange>)> {
        let (carries_install_info, raw): (bool, RawChanges) =
            self.call("ReenableUnitFiles", &(files, runtime, force)).await?;
        Ok((carries_install_info, changes(raw)))
    }

    /// Link unit files from outside the search path into it
    pub async fn link_unit_files(&self, files: &[&str], runtime: bool, force: bool) -> Result<Vec<UnitFileChange>> {
        let raw: RawChanges = self.call("LinkUnitFiles", &(files, runtime, force)).await?;
        Ok(changes(raw))
    }

    /// Enable or disable according to preset policy
    pub async fn preset_unit_files(
        &self,
        files: &[&str],
        runtime: bool,
        force: bool,
    ) -> Result<(bool, Vec<UnitFileChange>)> {
        let (carries_install_info, raw): (bool, RawChanges) =
            self.call("PresetUnitFiles", &(files, runtime, force)).await?;
        Ok((carries_install_info, changes(raw)))
    }

    pub async fn mask_unit_files(&self, files: &[&str], runtime: bool, force: bool) -> Result<Vec<UnitFileChange>> {
        let raw: RawChanges = self.call("MaskUnitFiles", &(files, runtime, force)).await?;
        Ok(changes(raw))
    }

    pub async fn unmask_unit_files(&self, files: &[&str], runtime: bool) -> Result<Vec<UnitFileChange>> {
        let raw: RawChanges = self.call("UnmaskUnitFiles", &(files, runtime)).await?;
        Ok(changes(raw))
    }

    /// Every installed unit file with its enablement status
    pub async fn list_unit_files(&self) -> Result<Vec<UnitFileEntry>> {
        let raw: Vec<(String, String)> = self.call("ListUnitFiles", &()).await?;
        Ok(raw.into_iter().map(UnitFileEntry::from).collect())
    }

    /// Enablement status of a unit file name (not path): "enabled", "disabled", "static", ...
    pub async fn get_unit_file_state(&self, file: &str) -> Result<String> {
        self.call("GetUnitFileState", &file).await
    }

    pub async fn set_default_target(&self, name: &str, force: bool) -> Result<Vec<UnitFileChange>> {
        let raw: RawChanges = self.call("SetDefaultTarget", &(name, force)).await?;
        Ok(changes(raw))
    }

    /// Name of the default target, e.g. "graphical.target"
    pub async fn get_default_target(&self) -> Result<String> {
        self.call("GetDefaultTarget", &()).await
    }
}
