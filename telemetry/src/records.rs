//! Loads trackpoints that've already been extracted from a GPX or TCX file into CSV.

use anyhow::Result;
use geom::Distance;
use serde::Deserialize;

use crate::{parse_timestamp, Format, Trackpoint};

/// Reads every row, in file order. The columns are `time,elevation,lat,lon,distance,cadence`;
/// everything besides `time` and `elevation` may be blank.
pub fn load<R: std::io::Read>(reader: R, format: Format) -> Result<Vec<Trackpoint>> {
    let mut points = Vec::new();
    let mut ignored = 0;
    for (idx, rec) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        let rec: Record = rec?;
        rec.check_finite()
            .map_err(|field| anyhow!("row {} has a non-finite {field}", idx + 1))?;
        let time =
            parse_timestamp(&rec.time).map_err(|err| anyhow!("row {}: {err}", idx + 1))?;
        let mut pt = Trackpoint::new(time, rec.elevation);

        match (rec.lat, rec.lon) {
            (Some(lat), Some(lon)) => {
                pt = pt.with_lat_lon(lat, lon);
            }
            (None, None) => {}
            _ => bail!("row {} has only one of lat and lon", idx + 1),
        }
        if let Some(dist) = rec.distance {
            pt = pt.with_cumulative_distance(Distance::meters(dist));
        }
        if let Some(cadence) = rec.cadence {
            pt = pt.with_cadence(cadence);
        }

        let unused = match format {
            Format::Gpx => pt.cumulative_distance.is_some(),
            Format::Tcx => pt.lat_lon.is_some(),
        };
        if unused {
            ignored += 1;
        }
        points.push(pt);
    }

    if ignored > 0 {
        let field = match format {
            Format::Gpx => "distance",
            Format::Tcx => "lat/lon",
        };
        warn!(
            "{} of {} trackpoints have a {} that {} input ignores",
            ignored,
            points.len(),
            field,
            format
        );
    }
    Ok(points)
}

#[derive(Deserialize)]
struct Record {
    time: String,
    elevation: f64,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Cumulative meters
    distance: Option<f64>,
    cadence: Option<f64>,
}

impl Record {
    /// `NaN` and `inf` parse as numbers, but nothing downstream can use them.
    fn check_finite(&self) -> std::result::Result<(), &'static str> {
        for (field, value) in [
            ("elevation", Some(self.elevation)),
            ("lat", self.lat),
            ("lon", self.lon),
            ("distance", self.distance),
            ("cadence", self.cadence),
        ] {
            if value.map(|x| !x.is_finite()).unwrap_or(false) {
                return Err(field);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpx_rows() {
        let input = "time,elevation,lat,lon,distance,cadence
2012-06-02T10:00:00Z,100.5,47.6,-122.3,,
2012-06-02T10:00:05Z,101.0,47.6001,-122.3001,,
";
        let points = load(input.as_bytes(), Format::Gpx).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].elevation, 100.5);
        assert_eq!(points[1].lat_lon, Some((47.6001, -122.3001)));
        assert!(points[1].cumulative_distance.is_none());
        assert!(points[1].cadence.is_none());
        assert_eq!(
            points[1].time,
            parse_timestamp("2012-06-02T10:00:05").unwrap()
        );
    }

    #[test]
    fn tcx_rows_without_position_columns() {
        let input = "time,elevation,distance,cadence
2012-06-02T10:00:00,100,0.0,85
2012-06-02T10:00:01,100,4.5,
";
        let points = load(input.as_bytes(), Format::Tcx).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].cadence, Some(85.0));
        assert_eq!(points[1].cadence, None);
        assert_eq!(
            points[1].cumulative_distance.map(|d| d.inner_meters()),
            Some(4.5)
        );
        assert!(points[0].lat_lon.is_none());
    }

    #[test]
    fn bad_rows() {
        let half_position = "time,elevation,lat,lon
2012-06-02T10:00:00,100,47.6,
";
        assert!(load(half_position.as_bytes(), Format::Gpx).is_err());

        let bad_time = "time,elevation
June 2nd,100
";
        let err = load(bad_time.as_bytes(), Format::Tcx).err().unwrap();
        assert!(err.to_string().contains("row 1"));

        let bad_elevation = "time,elevation
2012-06-02T10:00:00,high
";
        assert!(load(bad_elevation.as_bytes(), Format::Tcx).is_err());
    }

    #[test]
    fn non_finite_numbers() {
        for (input, field) in [
            (
                "time,elevation,distance\n2012-06-02T10:00:00,100,0\n2012-06-02T10:00:01,100,NaN\n",
                "row 2 has a non-finite distance",
            ),
            (
                "time,elevation,lat,lon\n2012-06-02T10:00:00,100,inf,-122.3\n",
                "row 1 has a non-finite lat",
            ),
            (
                "time,elevation,lat,lon\n2012-06-02T10:00:00,100,47.6,-inf\n",
                "row 1 has a non-finite lon",
            ),
            (
                "time,elevation\n2012-06-02T10:00:00,NaN\n",
                "row 1 has a non-finite elevation",
            ),
            (
                "time,elevation,cadence\n2012-06-02T10:00:00,100,inf\n",
                "row 1 has a non-finite cadence",
            ),
        ] {
            let err = load(input.as_bytes(), Format::Tcx).err().unwrap();
            assert_eq!(err.to_string(), field);
        }
    }
}
