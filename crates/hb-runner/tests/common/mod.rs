#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use hb_workspace::Workspace;

pub const HYD: &str = "\
hydrology.hyd: written by editor
name      lat_ttime     esco     epco
hyd001      0.00000  0.95000  1.00000
hyd002      0.00000  0.90000  1.00000
hyd003      0.00000  0.85000  1.00000
";

/// Prints a few lines (one Latin-1 encoded, one blank) and leaves a copy of
/// the hydrology table behind in its working directory.
pub const MODEL_SCRIPT: &str = "#!/bin/sh
echo '  SWAT+ test model'
echo ''
printf 'ratio \\351t\\351\\n'
test -f time.sim || { echo 'time.sim missing' 1>&2; exit 3; }
cp hydrology.hyd model_echo.txt
echo 'Execution successfully completed'
";

pub const FAILING_SCRIPT: &str = "#!/bin/sh
echo 'reading inputs'
echo 'ERROR: esco out of range' 1>&2
exit 2
";

/// Sleeps longer the smaller `esco` is on the first row, so sets with
/// ascending `esco` finish in descending order. Each run appends its `esco`
/// to `log` once done.
pub fn slow_model_script(log: &Path) -> String {
    format!(
        "#!/bin/sh
esco=$(awk 'NR == 3 {{ print $3 }}' hydrology.hyd)
sleep $(awk -v e=\"$esco\" 'BEGIN {{ printf \"%.1f\", 0.6 - e }}')
cp hydrology.hyd model_echo.txt
echo \"$esco\" >> '{}'
",
        log.display()
    )
}

pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "hb_runner_{}_{}",
        label,
        uuid::Uuid::new_v4().simple()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_executable(path: &Path, script: &str) {
    fs::write(path, script).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn build_txtinout(label: &str, script: &str) -> Workspace {
    let dir = scratch_dir(label);
    write_executable(&dir.join("swat.exe"), script);
    fs::write(dir.join("time.sim"), "time.sim\nday_start yrc_start day_end yrc_end step\n 0 1980 0 1985 0\n").unwrap();
    fs::write(dir.join("hydrology.hyd"), HYD).unwrap();
    fs::write(dir.join("soils.sol.tpl"), "soils.sol\nname awc\nsoil01 #awc#\n").unwrap();
    Workspace::open(&dir).unwrap()
}
