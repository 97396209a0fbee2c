use std::path::Path;

use plotters::prelude::*;

use placesim::rate_map::{
    occupancy_fraction, EmpiricalRateMaps, PopulationRateMap, TheoreticalRateMaps,
};

use crate::palette::viridis;
use crate::{ensure_parent_dir, PlotError, PlotResult};

const ORANGE: RGBColor = RGBColor(255, 127, 14);
const WIDE: (u32, u32) = (1200, 500);

fn row_height_px(n_rows: usize, per_row: u32) -> u32 {
    200 + per_row * n_rows.max(1) as u32
}

/// Bar chart of the fraction of samples in each spatial bin.
pub fn plot_occupancy(
    out_path: &Path,
    pos: &[f64],
    track_length: f64,
    n_bins: usize,
) -> PlotResult<()> {
    let (fractions, centers) = occupancy_fraction(pos, track_length, n_bins)?;
    let width = track_length / n_bins as f64;
    let y_max = fractions.iter().copied().fold(0.0f64, f64::max).max(1e-6) * 1.1;

    ensure_parent_dir(out_path)?;
    let root = BitMapBackend::new(out_path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Occupancy of regions along track", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..track_length, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("position (m)")
        .y_desc("occupancy fraction")
        .x_labels(11)
        .draw()?;

    for (&c, &f) in centers.iter().zip(&fractions) {
        let corners = [(c - 0.5 * width, 0.0), (c + 0.5 * width, f)];
        chart.draw_series(std::iter::once(Rectangle::new(corners, ORANGE.mix(0.8).filled())))?;
        chart.draw_series(std::iter::once(Rectangle::new(corners, BLACK.stroke_width(1))))?;
    }

    root.present()?;
    tracing::debug!(path = %out_path.display(), "wrote occupancy plot");
    Ok(())
}

/// Position against time.
pub fn plot_position(
    out_path: &Path,
    time: &[f64],
    pos: &[f64],
    track_length: f64,
) -> PlotResult<()> {
    if time.len() != pos.len() {
        return Err(PlotError::Validation(format!(
            "time ({}) and pos ({}) must have the same length",
            time.len(),
            pos.len()
        )));
    }
    let t_max = time.last().copied().unwrap_or(0.0).max(1e-6);

    ensure_parent_dir(out_path)?;
    let root = BitMapBackend::new(out_path, WIDE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Movement trajectory along track", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, 0.0..track_length)?;

    chart
        .configure_mesh()
        .x_desc("time (s)")
        .y_desc("position (m)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        time.iter().copied().zip(pos.iter().copied()),
        &BLUE,
    ))?;

    root.present()?;
    tracing::debug!(path = %out_path.display(), "wrote position plot");
    Ok(())
}

/// One row of spike ticks per neuron, labelled with its place-field center.
pub fn plot_spike_raster(
    out_path: &Path,
    spike_times: &[Vec<f64>],
    duration: f64,
    centers: &[f64],
) -> PlotResult<()> {
    let n = spike_times.len();
    if n != centers.len() {
        return Err(PlotError::Validation(format!(
            "number of neurons ({n}) and number of centers ({}) must match",
            centers.len()
        )));
    }

    ensure_parent_dir(out_path)?;
    let root = BitMapBackend::new(out_path, (1000, row_height_px(n, 50))).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Spike raster", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(170)
        .build_cartesian_2d(0.0..duration.max(1e-6), -0.5..(n as f64 - 0.5))?;

    let label = |y: &f64| {
        let i = y.round();
        if (y - i).abs() > 1e-6 || i < 0.0 || i as usize >= n {
            return String::new();
        }
        format!("Cell {} (center={:.2} m)", i as usize, centers[i as usize])
    };
    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Neurons")
        .y_labels(n.max(1))
        .y_label_formatter(&label)
        .disable_y_mesh()
        .draw()?;

    for (i, times) in spike_times.iter().enumerate() {
        let color = Palette99::pick(i);
        chart.draw_series(
            times
                .iter()
                .map(|&t| Circle::new((t, i as f64), 2, color.filled())),
        )?;
    }

    root.present()?;
    tracing::debug!(path = %out_path.display(), neurons = n, "wrote spike raster");
    Ok(())
}

/// Empirical rate map against the generating tuning curve, one panel per neuron.
pub fn plot_empirical_vs_theoretical(
    out_path: &Path,
    empirical: &EmpiricalRateMaps,
    theoretical: &TheoreticalRateMaps,
    centers: &[f64],
    peak_rates: &[f64],
    track_length: f64,
) -> PlotResult<()> {
    let n = empirical.rates.n_rows();
    if n != theoretical.rates.n_rows() {
        return Err(PlotError::Validation(format!(
            "empirical ({n}) and theoretical ({}) neuron counts must match",
            theoretical.rates.n_rows()
        )));
    }
    if n != centers.len() || n != peak_rates.len() {
        return Err(PlotError::Validation(format!(
            "neuron count ({n}) must match centers ({}) and peak rates ({})",
            centers.len(),
            peak_rates.len()
        )));
    }
    if empirical.rates.n_cols() != empirical.bin_centers.len() {
        return Err(PlotError::Validation(format!(
            "empirical bins ({}) and bin centers ({}) must match",
            empirical.rates.n_cols(),
            empirical.bin_centers.len()
        )));
    }
    if theoretical.rates.n_cols() != theoretical.x.len() {
        return Err(PlotError::Validation(format!(
            "theoretical samples ({}) and grid ({}) must match",
            theoretical.rates.n_cols(),
            theoretical.x.len()
        )));
    }
    if n == 0 {
        return Err(PlotError::Validation("no neurons to plot".to_string()));
    }

    ensure_parent_dir(out_path)?;
    let root = BitMapBackend::new(out_path, (1000, row_height_px(n, 180))).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((n, 1));

    for (i, panel) in panels.iter().enumerate() {
        let emp = empirical.rates.row(i);
        let theo = theoretical.rates.row(i);
        let y_max = emp
            .iter()
            .chain(theo)
            .copied()
            .fold(0.0f64, f64::max)
            .max(1e-6)
            * 1.1;

        let mut chart = ChartBuilder::on(panel)
            .caption(
                format!(
                    "Cell {i} place field: center={:.2} m, peak={:.1} Hz",
                    centers[i], peak_rates[i]
                ),
                ("sans-serif", 16),
            )
            .margin(8)
            .x_label_area_size(if i + 1 == n { 35 } else { 20 })
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..track_length, 0.0..y_max)?;

        let mut mesh = chart.configure_mesh();
        mesh.y_desc("Firing rate (Hz)");
        if i + 1 == n {
            mesh.x_desc("Position (m)");
        }
        mesh.draw()?;

        chart
            .draw_series(LineSeries::new(
                empirical.bin_centers.iter().copied().zip(emp.iter().copied()),
                &BLUE,
            ))?
            .label("Empirical rate (spikes / occupancy)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .draw_series(LineSeries::new(
                theoretical.x.iter().copied().zip(theo.iter().copied()),
                ORANGE.stroke_width(2),
            ))?
            .label("Theoretical Gaussian rate")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &ORANGE));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    tracing::debug!(path = %out_path.display(), neurons = n, "wrote rate map comparison");
    Ok(())
}

/// Heatmap of a population rate map with a colorbar.
pub fn plot_population_rate_map(out_path: &Path, map: &PopulationRateMap) -> PlotResult<()> {
    let n_neurons = map.n_neurons();
    let n_bins = map.n_bins();
    if n_neurons == 0 || n_bins == 0 {
        return Err(PlotError::Validation(
            "population rate map is empty".to_string(),
        ));
    }
    if let Some(bad) = map.rates.iter().position(|r| r.len() != n_bins) {
        return Err(PlotError::Validation(format!(
            "row {bad} has {} bins, expected {n_bins}",
            map.rates[bad].len()
        )));
    }

    let max_rate = map.max_rate().max(1e-6);
    let bin_width = map.track_length / n_bins as f64;

    ensure_parent_dir(out_path)?;
    let root = BitMapBackend::new(out_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let (left, right) = root.split_horizontally(860);

    let mut chart = ChartBuilder::on(&left)
        .caption("Firing rate heatmap", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..map.track_length, 0.0..n_neurons as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Position along track (m)")
        .y_desc("Neuron index")
        .draw()?;

    for (i, row) in map.rates.iter().enumerate() {
        chart.draw_series(row.iter().enumerate().map(|(b, &rate)| {
            let x0 = b as f64 * bin_width;
            Rectangle::new(
                [(x0, i as f64), (x0 + bin_width, i as f64 + 1.0)],
                viridis(rate / max_rate).filled(),
            )
        }))?;
    }

    let mut bar = ChartBuilder::on(&right)
        .margin_top(40)
        .margin_bottom(50)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, 0.0..max_rate as f64)?;

    bar.configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_desc("Firing rate (Hz)")
        .draw()?;

    const STEPS: usize = 100;
    let step = max_rate as f64 / STEPS as f64;
    bar.draw_series((0..STEPS).map(|k| {
        let y0 = k as f64 * step;
        Rectangle::new(
            [(0.0, y0), (1.0, y0 + step)],
            viridis((k as f32 + 0.5) / STEPS as f32).filled(),
        )
    }))?;

    root.present()?;
    tracing::debug!(
        path = %out_path.display(),
        neurons = n_neurons,
        bins = n_bins,
        "wrote population heatmap"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use placesim::prelude::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("placesim-vis-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn raster_rejects_mismatched_centers() {
        let err = plot_spike_raster(&scratch("raster.png"), &[vec![0.1], vec![]], 1.0, &[0.5])
            .unwrap_err();
        assert!(matches!(err, PlotError::Validation(_)));
    }

    #[test]
    fn position_rejects_mismatched_lengths() {
        let err = plot_position(&scratch("pos.png"), &[0.0, 0.1], &[0.5], 1.0).unwrap_err();
        assert!(matches!(err, PlotError::Validation(_)));
    }

    #[test]
    fn overlay_rejects_mismatched_neuron_counts() {
        let fields = PlaceFields::new(vec![0.2, 0.8], vec![0.1, 0.1], vec![5.0, 5.0], 0.0).unwrap();
        let theoretical = compute_theoretical_rate_maps(1.0, &fields).unwrap();
        let pos = vec![0.2, 0.8, 0.5];
        let empirical =
            compute_empirical_rate_maps(10, 1.0, &pos, 0.01, &[vec![0.2], vec![0.8]]).unwrap();

        let err = plot_empirical_vs_theoretical(
            &scratch("overlay.png"),
            &empirical,
            &theoretical,
            &[0.2],
            &[5.0, 5.0],
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::Validation(_)));

        let one_cell = compute_empirical_rate_maps(10, 1.0, &pos, 0.01, &[vec![0.2]]).unwrap();
        let err = plot_empirical_vs_theoretical(
            &scratch("overlay.png"),
            &one_cell,
            &theoretical,
            &[0.2, 0.8],
            &[5.0, 5.0],
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::Validation(_)));
    }

    #[test]
    fn heatmap_rejects_empty_map() {
        let map = PopulationRateMap {
            rates: Vec::new(),
            bin_centers: vec![0.5],
            track_length: 1.0,
        };
        let err = plot_population_rate_map(&scratch("heat.png"), &map).unwrap_err();
        assert!(matches!(err, PlotError::Validation(_)));
    }

    #[test]
    fn occupancy_rejects_zero_bins() {
        let err = plot_occupancy(&scratch("occ.png"), &[0.5], 1.0, 0).unwrap_err();
        assert!(matches!(err, PlotError::Sim(_)));
    }
}
